// Static team catalog and the per-team playing elevens.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

pub type TeamId = String;
pub type PlayerId = String;

/// Number of players in every team's playing eleven.
pub const SQUAD_SIZE: usize = 11;

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// A tournament team. Only `id` matters to the engine; the rest is carried
/// for presentation. `points` and `nrr` are never computed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub planet: String,
    pub color: String,
    pub icon: String,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub nrr: f64,
}

/// (id, name, planet, color) for the six participating teams.
const CATALOG: [(&str, &str, &str, &str); 6] = [
    ("A", "Jupiter Princes", "Jupiter", "#FFD700"),
    ("B", "Venus Vertex", "Venus", "#FF69B4"),
    ("C", "Earth Guardians", "Earth", "#1E90FF"),
    ("D", "Pluto Phantoms", "Pluto", "#32CD32"),
    ("E", "Mars Warriors", "Mars", "#FF4500"),
    ("F", "Mercury Strikers", "Mercury", "#C0C0C0"),
];

impl Team {
    /// The fixed team catalog, in seeding order.
    pub fn catalog() -> Vec<Team> {
        CATALOG
            .iter()
            .map(|&(id, name, planet, color)| Team {
                id: id.to_string(),
                name: name.to_string(),
                planet: planet.to_string(),
                color: color.to_string(),
                icon: planet.to_lowercase(),
                points: 0,
                nrr: 0.0,
            })
            .collect()
    }

    /// The catalog entry for `id`.
    pub fn find(id: &str) -> Option<Team> {
        Self::catalog().into_iter().find(|team| team.id == id)
    }

    /// Display name for a team id. Unknown ids are shown as given.
    pub fn name_of(id: &str) -> &str {
        CATALOG
            .iter()
            .find(|(team, ..)| *team == id)
            .map_or(id, |&(_, name, ..)| name)
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Informational playing role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Bat,
    All,
    Bowl,
}

impl Role {
    /// Default role for a squad slot: 5 batters, 3 all-rounders, 3 bowlers.
    fn for_slot(index: usize) -> Self {
        match index {
            0..=4 => Role::Bat,
            5..=7 => Role::All,
            _ => Role::Bowl,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Bat => "BAT",
            Role::All => "ALL",
            Role::Bowl => "BOWL",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BAT" => Ok(Role::Bat),
            "ALL" => Ok(Role::All),
            "BOWL" => Ok(Role::Bowl),
            other => Err(EngineError::validation(
                "role",
                format!("expected BAT, ALL or BOWL, got {other:?}"),
            )),
        }
    }
}

/// Batting figures accumulated across the tournament.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BattingFigures {
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub is_out: bool,
    pub dismissal: String,
}

/// Bowling figures accumulated across the tournament.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BowlingFigures {
    pub overs_completed: u32,
    /// Legal balls bowled since this bowler last completed an over.
    pub balls_in_over: u32,
    pub runs_conceded: u32,
    pub wickets_taken: u32,
    pub extras_conceded: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub team_id: TeamId,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub batting: BattingFigures,
    #[serde(default)]
    pub bowling: BowlingFigures,
}

impl Player {
    fn fresh(team_id: &str, index: usize) -> Self {
        Player {
            id: format!("{team_id}_{index}"),
            team_id: team_id.to_string(),
            name: format!("Player {}", index + 1),
            role: Role::for_slot(index),
            batting: BattingFigures::default(),
            bowling: BowlingFigures::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Every team's ordered playing eleven, keyed by team id.
///
/// Order matters: the first two players open the batting, the last one opens
/// the bowling, and replacement batters are taken in roster order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    teams: BTreeMap<TeamId, Vec<Player>>,
}

impl Default for Roster {
    fn default() -> Self {
        let teams = CATALOG
            .iter()
            .map(|&(id, ..)| {
                let squad = (0..SQUAD_SIZE).map(|i| Player::fresh(id, i)).collect();
                (id.to_string(), squad)
            })
            .collect();
        Roster { teams }
    }
}

impl Roster {
    pub(crate) fn from_teams(teams: BTreeMap<TeamId, Vec<Player>>) -> Self {
        Roster { teams }
    }

    pub(crate) fn into_teams(self) -> BTreeMap<TeamId, Vec<Player>> {
        self.teams
    }

    /// A team's eleven in batting order.
    pub fn squad(&self, team_id: &str) -> Option<&[Player]> {
        self.teams.get(team_id).map(Vec::as_slice)
    }

    pub fn player(&self, team_id: &str, player_id: &str) -> Option<&Player> {
        self.squad(team_id)?.iter().find(|p| p.id == player_id)
    }

    pub(crate) fn player_mut(&mut self, team_id: &str, player_id: &str) -> Option<&mut Player> {
        self.teams
            .get_mut(team_id)?
            .iter_mut()
            .find(|p| p.id == player_id)
    }

    /// The player at a fixed squad position.
    pub(crate) fn slot(&self, team_id: &str, index: usize) -> EngineResult<&Player> {
        self.squad(team_id)
            .ok_or_else(|| EngineError::team_not_found(team_id))?
            .get(index)
            .ok_or_else(|| {
                EngineError::invalid_state(format!(
                    "team {team_id} has no player in squad slot {index}"
                ))
            })
    }

    /// Every player of every team, teams in id order.
    pub fn all_players(&self) -> impl Iterator<Item = &Player> {
        self.teams.values().flatten()
    }

    pub fn team_ids(&self) -> impl Iterator<Item = &TeamId> {
        self.teams.keys()
    }

    /// Rename a player and/or change their role.
    pub fn update_player(
        &mut self,
        team_id: &str,
        player_id: &str,
        name: Option<&str>,
        role: Option<Role>,
    ) -> EngineResult<()> {
        if !self.teams.contains_key(team_id) {
            return Err(EngineError::team_not_found(team_id));
        }
        let name = match name.map(str::trim) {
            Some("") => {
                return Err(EngineError::validation("name", "player name cannot be empty"));
            }
            other => other,
        };
        let player = self
            .player_mut(team_id, player_id)
            .ok_or_else(|| EngineError::player_not_found(player_id))?;
        if let Some(name) = name {
            player.name = name.to_string();
        }
        if let Some(role) = role {
            player.role = role;
        }
        Ok(())
    }
}
