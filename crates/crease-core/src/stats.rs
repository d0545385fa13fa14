// Read-only statistics over player figures: rates and leaderboards.

use serde::Serialize;

use crate::bracket::{Overs, BALLS_PER_OVER};
use crate::roster::{BattingFigures, BowlingFigures, Player, PlayerId, Roster, TeamId};

/// Runs per hundred balls faced.
pub fn strike_rate(batting: &BattingFigures) -> f64 {
    if batting.balls_faced == 0 {
        return 0.0;
    }
    f64::from(batting.runs) * 100.0 / f64::from(batting.balls_faced)
}

/// Runs conceded per over, counting part-overs as fractions.
pub fn economy(bowling: &BowlingFigures) -> f64 {
    let overs = f64::from(bowling.overs_completed)
        + f64::from(bowling.balls_in_over) / f64::from(BALLS_PER_OVER);
    if overs == 0.0 {
        return 0.0;
    }
    f64::from(bowling.runs_conceded) / overs
}

pub fn overs_bowled(bowling: &BowlingFigures) -> Overs {
    Overs::from_legal_balls(bowling.overs_completed * BALLS_PER_OVER + bowling.balls_in_over)
}

/// Batter worth watching: 30+ runs, or scoring at better than two a ball
/// after settling in.
pub fn is_hot_batter(batting: &BattingFigures) -> bool {
    batting.runs >= 30 || (batting.balls_faced >= 10 && strike_rate(batting) > 200.0)
}

/// Bowler worth watching: 2+ wickets, or tight over a couple of overs.
pub fn is_hot_bowler(bowling: &BowlingFigures) -> bool {
    bowling.wickets_taken >= 2 || (bowling.overs_completed >= 2 && economy(bowling) <= 6.0)
}

// ---------------------------------------------------------------------------
// Leaderboards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatterRow {
    pub player_id: PlayerId,
    pub name: String,
    pub team_id: TeamId,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: f64,
}

impl BatterRow {
    fn from_player(p: &Player) -> Self {
        BatterRow {
            player_id: p.id.clone(),
            name: p.name.clone(),
            team_id: p.team_id.clone(),
            runs: p.batting.runs,
            balls_faced: p.batting.balls_faced,
            fours: p.batting.fours,
            sixes: p.batting.sixes,
            strike_rate: strike_rate(&p.batting),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BowlerRow {
    pub player_id: PlayerId,
    pub name: String,
    pub team_id: TeamId,
    pub wickets: u32,
    pub runs_conceded: u32,
    pub overs: Overs,
    pub economy: f64,
}

impl BowlerRow {
    fn from_player(p: &Player) -> Self {
        BowlerRow {
            player_id: p.id.clone(),
            name: p.name.clone(),
            team_id: p.team_id.clone(),
            wickets: p.bowling.wickets_taken,
            runs_conceded: p.bowling.runs_conceded,
            overs: overs_bowled(&p.bowling),
            economy: economy(&p.bowling),
        }
    }
}

/// Highest run scorers, fewest balls first on equal runs. Players without
/// a run are left out.
pub fn top_batters(roster: &Roster, limit: usize) -> Vec<BatterRow> {
    let mut rows: Vec<BatterRow> = roster
        .all_players()
        .filter(|p| p.batting.runs > 0)
        .map(BatterRow::from_player)
        .collect();
    rows.sort_by(|a, b| {
        b.runs
            .cmp(&a.runs)
            .then_with(|| a.balls_faced.cmp(&b.balls_faced))
    });
    rows.truncate(limit);
    rows
}

/// Leading wicket takers, cheapest first on equal wickets. Players without
/// a wicket are left out.
pub fn top_bowlers(roster: &Roster, limit: usize) -> Vec<BowlerRow> {
    let mut rows: Vec<BowlerRow> = roster
        .all_players()
        .filter(|p| p.bowling.wickets_taken > 0)
        .map(BowlerRow::from_player)
        .collect();
    rows.sort_by(|a, b| {
        b.wickets
            .cmp(&a.wickets)
            .then_with(|| a.runs_conceded.cmp(&b.runs_conceded))
    });
    rows.truncate(limit);
    rows
}
