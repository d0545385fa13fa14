// Plain-text rendering of tournament state for the console.

use std::fmt::Write;

use crease_core::bracket::{Match, MatchStatus, Overs};
use crease_core::roster::{Roster, Team};
use crease_core::scoring::{DeliveryOutcome, DeliveryRecord, ScoringSession};
use crease_core::stats;
use crease_core::TournamentState;

const LEADERBOARD_SIZE: usize = 5;

/// The bracket, one line per match, plus the live innings if any.
pub fn render_overview(t: &TournamentState) -> String {
    let mut out = String::new();
    for m in t.bracket().matches() {
        let _ = writeln!(out, "{}", match_line(m));
    }
    if let Some(champion) = t.champion() {
        let _ = writeln!(out, "Champion: {}", Team::name_of(champion));
    }
    if let Some(session) = t.session() {
        out.push('\n');
        out.push_str(&render_session(session, t.roster()));
    }
    out.trim_end().to_string()
}

fn match_line(m: &Match) -> String {
    let side = |team: &Option<String>, score: Option<u32>, overs: Option<Overs>| {
        let Some(t) = team else {
            return "TBD".to_string();
        };
        let name = Team::name_of(t);
        match (score, overs) {
            (Some(s), Some(o)) => format!("{name} {s} ({o})"),
            (Some(s), None) => format!("{name} {s}"),
            (None, _) => name.to_string(),
        }
    };
    let mut line = format!(
        "{:<4} {:<20} {:<7} {} v {}",
        m.id,
        m.label,
        m.status,
        side(&m.team1, m.score1, m.overs1),
        side(&m.team2, m.score2, m.overs2),
    );
    if m.status == MatchStatus::Done {
        if let Some(w) = &m.winner {
            let _ = write!(line, "  -> {} won", Team::name_of(w));
        }
    } else if let (Some(t), Some(d)) = (&m.toss_winner, m.toss_decision) {
        let _ = write!(
            line,
            "  [{} chose to {}]",
            Team::name_of(t),
            format!("{d:?}").to_lowercase()
        );
    }
    line
}

/// Scoreboard for the innings being scored.
pub fn render_session(s: &ScoringSession, roster: &Roster) -> String {
    let name = |team: &str, id: &str| {
        roster
            .player(team, id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let mut out = format!(
        "{} innings {}: {} {}/{} ({})",
        s.match_id,
        s.innings,
        Team::name_of(&s.batting_team),
        s.runs,
        s.wickets,
        s.overs_bowled()
    );
    if let Some(needed) = s.runs_needed() {
        let _ = write!(out, ", need {needed}");
    }
    if s.complete {
        out.push_str(" - innings over");
    }
    let _ = write!(
        out,
        "\n  striker {}  non-striker {}  bowler {}",
        name(&s.batting_team, &s.striker),
        name(&s.batting_team, &s.non_striker),
        name(&s.fielding_team, &s.bowler),
    );
    if !s.current_over.is_empty() {
        let _ = write!(out, "\n  this over: {}", over_line(&s.current_over));
    }
    out
}

fn over_line(records: &[DeliveryRecord]) -> String {
    records
        .iter()
        .map(|r| r.kind.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A short note on what the last ball did.
pub fn render_outcome(outcome: &DeliveryOutcome) -> Option<String> {
    let mut notes = Vec::new();
    if let Some(out) = &outcome.dismissed {
        notes.push(format!("{out} is out"));
    }
    if outcome.over_completed {
        notes.push("end of over".to_string());
    }
    if outcome.innings_complete {
        notes.push("innings complete".to_string());
    }
    (!notes.is_empty()).then(|| notes.join(", "))
}

/// Top batters and bowlers. `*` marks a player in form.
pub fn render_leaders(roster: &Roster) -> String {
    let mut out = String::from("Batting\n");
    let batters = stats::top_batters(roster, LEADERBOARD_SIZE);
    if batters.is_empty() {
        out.push_str("  no runs yet\n");
    }
    for b in batters {
        let hot = roster
            .player(&b.team_id, &b.player_id)
            .is_some_and(|p| stats::is_hot_batter(&p.batting));
        let _ = writeln!(
            out,
            "  {:<16} {:<2} {:>4} ({} balls, {}x4, {}x6) SR {:.1}{}",
            b.name,
            b.team_id,
            b.runs,
            b.balls_faced,
            b.fours,
            b.sixes,
            b.strike_rate,
            if hot { " *" } else { "" }
        );
    }

    out.push_str("Bowling\n");
    let bowlers = stats::top_bowlers(roster, LEADERBOARD_SIZE);
    if bowlers.is_empty() {
        out.push_str("  no wickets yet\n");
    }
    for b in bowlers {
        let hot = roster
            .player(&b.team_id, &b.player_id)
            .is_some_and(|p| stats::is_hot_bowler(&p.bowling));
        let _ = writeln!(
            out,
            "  {:<16} {:<2} {}-{} ({}) econ {:.2}{}",
            b.name,
            b.team_id,
            b.wickets,
            b.runs_conceded,
            b.overs,
            b.economy,
            if hot { " *" } else { "" }
        );
    }
    out.trim_end().to_string()
}
