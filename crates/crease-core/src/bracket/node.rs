// Match records (bracket nodes) and the small value types they carry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::roster::TeamId;

pub type MatchId = String;

/// Overs allowed per innings.
pub const MAX_OVERS: u32 = 8;

/// Legal deliveries in one over.
pub const BALLS_PER_OVER: u32 = 6;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Lifecycle of a bracket match.
///
/// `Locked` until both slots are known, `Pending` until a scoring session
/// starts, `Live` while being scored, `Done` once the result is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Locked,
    Pending,
    Live,
    Done,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::Locked => "locked",
            MatchStatus::Pending => "pending",
            MatchStatus::Live => "live",
            MatchStatus::Done => "done",
        };
        f.pad(s)
    }
}

/// What the toss winner chose to do first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TossDecision {
    Bat,
    Bowl,
}

impl FromStr for TossDecision {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BAT" => Ok(TossDecision::Bat),
            "BOWL" => Ok(TossDecision::Bowl),
            other => Err(EngineError::validation(
                "decision",
                format!("expected BAT or BOWL, got {other:?}"),
            )),
        }
    }
}

/// One of the two team positions of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    Team1,
    Team2,
}

/// Which side of a finished match an advancement rule forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Winner,
    Loser,
}

// ---------------------------------------------------------------------------
// Overs
// ---------------------------------------------------------------------------

/// Completed overs plus legal balls into the next one, written `o.b`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "SavedOvers", into = "String")]
pub struct Overs {
    overs: u32,
    balls: u32,
}

impl Overs {
    pub fn new(overs: u32, balls: u32) -> EngineResult<Self> {
        if balls >= BALLS_PER_OVER {
            return Err(EngineError::validation(
                "overs",
                format!("an over has {BALLS_PER_OVER} balls, got {overs}.{balls}"),
            ));
        }
        Ok(Overs { overs, balls })
    }

    /// Regroup a count of legal balls into overs.
    pub fn from_legal_balls(balls: u32) -> Self {
        Overs {
            overs: balls / BALLS_PER_OVER,
            balls: balls % BALLS_PER_OVER,
        }
    }

    pub fn overs(&self) -> u32 {
        self.overs
    }

    pub fn balls(&self) -> u32 {
        self.balls
    }

    /// Whether this exceeds the per-innings allowance of `MAX_OVERS`.
    pub fn exceeds_cap(&self) -> bool {
        self.overs > MAX_OVERS || (self.overs == MAX_OVERS && self.balls > 0)
    }
}

impl fmt::Display for Overs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.overs, self.balls)
    }
}

impl FromStr for Overs {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (overs, balls) = s.split_once('.').unwrap_or((s, "0"));
        let parse = |part: &str| {
            part.parse::<u32>().map_err(|_| {
                EngineError::validation("overs", format!("expected overs like 7.3, got {s:?}"))
            })
        };
        Overs::new(parse(overs)?, parse(balls)?)
    }
}

/// Overs as found in a saved document: `"7.3"`, or a bare JSON number such
/// as `8` or `7.3`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SavedOvers {
    Text(String),
    Whole(u32),
    Decimal(f64),
}

impl TryFrom<SavedOvers> for Overs {
    type Error = EngineError;

    fn try_from(value: SavedOvers) -> Result<Self, Self::Error> {
        match value {
            SavedOvers::Text(s) => s.parse(),
            SavedOvers::Whole(overs) => Overs::new(overs, 0),
            SavedOvers::Decimal(n) if n.is_finite() && n >= 0.0 => {
                // The digit after the point counts balls, not tenths.
                let tenths = (n * 10.0).round() as u32;
                Overs::new(tenths / 10, tenths % 10)
            }
            SavedOvers::Decimal(n) => Err(EngineError::validation(
                "overs",
                format!("expected overs like 7.3, got {n}"),
            )),
        }
    }
}

impl From<Overs> for String {
    fn from(value: Overs) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// Final scores and overs for a match, indexed by team slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchScores {
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub overs1: Option<Overs>,
    pub overs2: Option<Overs>,
}

/// A bracket node.
///
/// `score1`/`overs1` always describe the team in slot `team1`, regardless of
/// which side batted first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub label: String,
    pub team1: Option<TeamId>,
    pub team2: Option<TeamId>,
    pub toss_winner: Option<TeamId>,
    pub toss_decision: Option<TossDecision>,
    pub status: MatchStatus,
    pub winner: Option<TeamId>,
    pub loser: Option<TeamId>,
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub overs1: Option<Overs>,
    pub overs2: Option<Overs>,
}

impl Match {
    /// A seeded match with both contestants known.
    pub fn seeded(id: &str, label: &str, team1: &str, team2: &str) -> Self {
        Match {
            id: id.to_string(),
            label: label.to_string(),
            team1: Some(team1.to_string()),
            team2: Some(team2.to_string()),
            status: MatchStatus::Pending,
            ..Default::default()
        }
    }

    /// A match waiting on upstream results.
    pub fn locked(id: &str, label: &str) -> Self {
        Match {
            id: id.to_string(),
            label: label.to_string(),
            ..Default::default()
        }
    }

    /// Both contestants, once resolved.
    pub fn contestants(&self) -> Option<(&TeamId, &TeamId)> {
        Some((self.team1.as_ref()?, self.team2.as_ref()?))
    }

    pub fn is_contestant(&self, team_id: &str) -> bool {
        self.team1.as_deref() == Some(team_id) || self.team2.as_deref() == Some(team_id)
    }

    /// The other contestant, when `team_id` is one of them.
    pub fn opponent_of(&self, team_id: &str) -> Option<&TeamId> {
        let (t1, t2) = self.contestants()?;
        if t1 == team_id {
            Some(t2)
        } else if t2 == team_id {
            Some(t1)
        } else {
            None
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<&TeamId> {
        match slot {
            Slot::Team1 => self.team1.as_ref(),
            Slot::Team2 => self.team2.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: Slot) -> &mut Option<TeamId> {
        match slot {
            Slot::Team1 => &mut self.team1,
            Slot::Team2 => &mut self.team2,
        }
    }

    /// The slot a contestant occupies.
    pub fn slot_of(&self, team_id: &str) -> Option<Slot> {
        if self.team1.as_deref() == Some(team_id) {
            Some(Slot::Team1)
        } else if self.team2.as_deref() == Some(team_id) {
            Some(Slot::Team2)
        } else {
            None
        }
    }

    /// The side batting first, derived from the toss.
    pub fn batting_first(&self) -> Option<&TeamId> {
        let toss_winner = self.toss_winner.as_ref()?;
        let other = self.opponent_of(toss_winner)?;
        match self.toss_decision? {
            TossDecision::Bat => Some(toss_winner),
            TossDecision::Bowl => Some(other),
        }
    }

    pub fn scores(&self) -> MatchScores {
        MatchScores {
            score1: self.score1,
            score2: self.score2,
            overs1: self.overs1,
            overs2: self.overs2,
        }
    }

    pub(crate) fn set_scores(&mut self, scores: MatchScores) {
        self.score1 = scores.score1;
        self.score2 = scores.score2;
        self.overs1 = scores.overs1;
        self.overs2 = scores.overs2;
    }

    /// Score and overs recorded for one contestant.
    pub fn score_of(&self, team_id: &str) -> Option<(u32, Option<Overs>)> {
        match self.slot_of(team_id)? {
            Slot::Team1 => Some((self.score1?, self.overs1)),
            Slot::Team2 => Some((self.score2?, self.overs2)),
        }
    }

    pub(crate) fn set_score_of(&mut self, slot: Slot, runs: u32, overs: Overs) {
        match slot {
            Slot::Team1 => {
                self.score1 = Some(runs);
                self.overs1 = Some(overs);
            }
            Slot::Team2 => {
                self.score2 = Some(runs);
                self.overs2 = Some(overs);
            }
        }
    }

    /// Locked → Pending once both slots are filled. Returns whether the
    /// match was promoted by this call.
    pub(crate) fn promote_if_ready(&mut self) -> bool {
        if self.status == MatchStatus::Locked && self.contestants().is_some() {
            self.status = MatchStatus::Pending;
            return true;
        }
        false
    }
}
