// Bracket advancement graph: match nodes, advancement edges, and the status
// transitions driven by results.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info};

use super::layout::{standard_matches, standard_rules, AdvancementRule, FINAL_MATCH};
use super::node::{Match, MatchId, MatchScores, MatchStatus, Outcome, Overs, TossDecision};
use crate::error::{EngineError, EngineResult};
use crate::roster::TeamId;

/// Which team bats in an innings, which fields, and what the chase needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InningsSides {
    pub batting: TeamId,
    pub fielding: TeamId,
    pub target: Option<u32>,
}

/// The tournament's match DAG.
///
/// Matches are kept in display order. Rules are validated once at
/// construction; a rule pointing at a match that does not exist is a broken
/// static layout, not bad input, and aborts.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketGraph {
    matches: Vec<Match>,
    rules: Vec<AdvancementRule>,
    terminal: MatchId,
    champion: Option<TeamId>,
}

impl Default for BracketGraph {
    fn default() -> Self {
        Self::standard()
    }
}

impl BracketGraph {
    /// Build a graph from matches and rules.
    ///
    /// # Panics
    /// If match ids repeat, the terminal match is missing, a rule references
    /// an unknown match, or the rules contain a cycle.
    pub fn new(matches: Vec<Match>, rules: Vec<AdvancementRule>, terminal: &str) -> Self {
        let ids: HashSet<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), matches.len(), "duplicate match id in bracket layout");
        assert!(
            ids.contains(terminal),
            "terminal match {terminal} missing from bracket layout"
        );
        for rule in &rules {
            assert!(
                ids.contains(rule.source.as_str()) && ids.contains(rule.destination.as_str()),
                "advancement rule {} -> {} references an unknown match",
                rule.source,
                rule.destination
            );
        }
        assert!(is_acyclic(&ids, &rules), "advancement rules contain a cycle");

        BracketGraph {
            matches,
            rules,
            terminal: terminal.to_string(),
            champion: None,
        }
    }

    /// The fixed eight-slot layout with nothing played.
    pub fn standard() -> Self {
        Self::new(standard_matches(), standard_rules(), FINAL_MATCH)
    }

    /// Standard rules over previously saved match records.
    pub(crate) fn restore(matches: Vec<Match>, champion: Option<TeamId>) -> Self {
        let mut graph = Self::new(matches, standard_rules(), FINAL_MATCH);
        graph.champion = champion;
        graph
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn rules(&self) -> &[AdvancementRule] {
        &self.rules
    }

    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    pub fn champion(&self) -> Option<&TeamId> {
        self.champion.as_ref()
    }

    pub fn get(&self, match_id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    fn get_mut(&mut self, match_id: &str) -> EngineResult<&mut Match> {
        self.matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or_else(|| EngineError::match_not_found(match_id))
    }

    fn lookup(&self, match_id: &str) -> EngineResult<&Match> {
        self.get(match_id)
            .ok_or_else(|| EngineError::match_not_found(match_id))
    }

    /// Matches that can be scored right now.
    pub fn playable(&self) -> impl Iterator<Item = &Match> {
        self.matches
            .iter()
            .filter(|m| matches!(m.status, MatchStatus::Pending | MatchStatus::Live))
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    /// Record a match result and advance both sides downstream.
    ///
    /// Completing a match that is already done changes nothing and returns
    /// `Ok(false)`, so duplicate submissions are harmless.
    pub fn complete_match(
        &mut self,
        match_id: &str,
        winner: &str,
        loser: &str,
        scores: MatchScores,
    ) -> EngineResult<bool> {
        let m = self.lookup(match_id)?;
        if m.status == MatchStatus::Done {
            debug!("Ignoring repeated completion of {}", match_id);
            return Ok(false);
        }
        if m.contestants().is_none() {
            return Err(EngineError::invalid_state(format!(
                "{match_id} has no opponents yet"
            )));
        }
        if winner == loser || m.opponent_of(winner).map(String::as_str) != Some(loser) {
            return Err(EngineError::validation(
                "winner",
                format!("{winner} beating {loser} is not a result of {match_id}"),
            ));
        }
        check_overs_cap("overs1", scores.overs1)?;
        check_overs_cap("overs2", scores.overs2)?;

        let m = self.get_mut(match_id)?;
        m.winner = Some(winner.to_string());
        m.loser = Some(loser.to_string());
        m.set_scores(scores);
        m.status = MatchStatus::Done;
        info!("{} complete: {} beat {}", match_id, winner, loser);

        self.propagate(match_id, winner, loser);
        if match_id == self.terminal {
            info!("Champion crowned: {}", winner);
            self.champion = Some(winner.to_string());
        }
        Ok(true)
    }

    /// Declare a winner without ball-by-ball detail.
    pub fn quick_win(&mut self, match_id: &str, winner: &str) -> EngineResult<()> {
        let m = self.lookup(match_id)?;
        if m.contestants().is_none() {
            return Err(EngineError::invalid_state(format!(
                "teams for {match_id} not yet determined"
            )));
        }
        if m.status == MatchStatus::Done {
            return Err(EngineError::invalid_state(format!("{match_id} is already done")));
        }
        let loser = m.opponent_of(winner).cloned().ok_or_else(|| {
            EngineError::validation("winner", format!("{winner} is not playing {match_id}"))
        })?;
        self.complete_match(match_id, winner, &loser, MatchScores::default())?;
        Ok(())
    }

    /// Correct the scores of a finished match.
    ///
    /// The winner is recomputed from the scores. When it changes, both sides
    /// are re-propagated downstream, overwriting what the original result
    /// placed there. Returns whether the winner changed.
    pub fn admin_override(
        &mut self,
        match_id: &str,
        score1: u32,
        score2: u32,
        overs1: Overs,
        overs2: Overs,
    ) -> EngineResult<bool> {
        check_overs_cap("overs1", Some(overs1))?;
        check_overs_cap("overs2", Some(overs2))?;
        let m = self.lookup(match_id)?;
        if m.status != MatchStatus::Done {
            return Err(EngineError::invalid_state(format!(
                "{match_id} is not completed yet"
            )));
        }
        let (team1, team2) = m.contestants().ok_or_else(|| {
            EngineError::invalid_state(format!("{match_id} has no opponents recorded"))
        })?;
        if score1 == score2 {
            return Err(EngineError::validation(
                "score2",
                "scores are level; ties cannot decide a knockout match",
            ));
        }
        let (new_winner, new_loser) = if score1 > score2 {
            (team1.clone(), team2.clone())
        } else {
            (team2.clone(), team1.clone())
        };
        let changed = m.winner.as_deref() != Some(new_winner.as_str());

        let m = self.get_mut(match_id)?;
        m.set_scores(MatchScores {
            score1: Some(score1),
            score2: Some(score2),
            overs1: Some(overs1),
            overs2: Some(overs2),
        });
        if !changed {
            info!("{} scores corrected, result unchanged", match_id);
            return Ok(false);
        }

        m.winner = Some(new_winner.clone());
        m.loser = Some(new_loser.clone());
        info!(
            "{} result overturned: {} now beat {}",
            match_id, new_winner, new_loser
        );
        self.propagate(match_id, &new_winner, &new_loser);
        if match_id == self.terminal {
            info!("Champion recomputed: {}", new_winner);
            self.champion = Some(new_winner);
        }
        Ok(true)
    }

    /// Clear a match's result and toss so it can be replayed.
    ///
    /// Player figures credited while scoring the match are left as they are,
    /// and teams already propagated downstream stay in place.
    pub fn reset_match(&mut self, match_id: &str) -> EngineResult<()> {
        let is_terminal = match_id == self.terminal;
        let m = self.get_mut(match_id)?;
        m.winner = None;
        m.loser = None;
        m.set_scores(MatchScores::default());
        m.toss_winner = None;
        m.toss_decision = None;
        m.status = if m.contestants().is_some() {
            MatchStatus::Pending
        } else {
            MatchStatus::Locked
        };
        if is_terminal {
            self.champion = None;
        }
        info!("{} reset", match_id);
        Ok(())
    }

    /// Record the toss. Required before a scoring session can start.
    pub fn set_toss(
        &mut self,
        match_id: &str,
        toss_winner: &str,
        decision: TossDecision,
    ) -> EngineResult<()> {
        let m = self.get_mut(match_id)?;
        match m.status {
            MatchStatus::Done => {
                return Err(EngineError::invalid_state(format!("{match_id} is already done")))
            }
            MatchStatus::Live => {
                return Err(EngineError::invalid_state(format!(
                    "{match_id} is live; the toss cannot change"
                )))
            }
            MatchStatus::Locked => {
                return Err(EngineError::invalid_state(format!(
                    "teams for {match_id} not yet determined"
                )))
            }
            MatchStatus::Pending => {}
        }
        if !m.is_contestant(toss_winner) {
            return Err(EngineError::validation(
                "toss_winner",
                format!("{toss_winner} is not playing {match_id}"),
            ));
        }
        m.toss_winner = Some(toss_winner.to_string());
        m.toss_decision = Some(decision);
        debug!("{} toss: {} chose {:?}", match_id, toss_winner, decision);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scoring support
    // ------------------------------------------------------------------

    /// Work out who bats in `innings` without changing anything.
    pub(crate) fn innings_sides(&self, match_id: &str, innings: u8) -> EngineResult<InningsSides> {
        let m = self.lookup(match_id)?;
        if !(1..=2).contains(&innings) {
            return Err(EngineError::validation(
                "innings",
                format!("innings must be 1 or 2, got {innings}"),
            ));
        }
        if m.status == MatchStatus::Done {
            return Err(EngineError::invalid_state(format!("{match_id} is already done")));
        }
        if m.contestants().is_none() {
            return Err(EngineError::invalid_state(format!(
                "teams for {match_id} not yet determined"
            )));
        }
        let first = m.batting_first().ok_or_else(|| {
            EngineError::invalid_state(format!("toss for {match_id} has not been recorded"))
        })?;
        let second = m
            .opponent_of(first)
            .ok_or_else(|| EngineError::invalid_state(format!("{match_id} has no opponent")))?;

        if innings == 1 {
            return Ok(InningsSides {
                batting: first.clone(),
                fielding: second.clone(),
                target: None,
            });
        }
        let (first_score, _) = m.score_of(first).ok_or_else(|| {
            EngineError::invalid_state(format!(
                "first innings score for {match_id} has not been recorded"
            ))
        })?;
        Ok(InningsSides {
            batting: second.clone(),
            fielding: first.clone(),
            target: Some(first_score + 1),
        })
    }

    pub(crate) fn mark_live(&mut self, match_id: &str) -> EngineResult<()> {
        self.get_mut(match_id)?.status = MatchStatus::Live;
        Ok(())
    }

    /// Store one side's innings total in its team slot.
    pub(crate) fn record_innings_score(
        &mut self,
        match_id: &str,
        team_id: &str,
        runs: u32,
        overs: Overs,
    ) -> EngineResult<()> {
        let m = self.get_mut(match_id)?;
        let slot = m.slot_of(team_id).ok_or_else(|| {
            EngineError::validation("team", format!("{team_id} is not playing {match_id}"))
        })?;
        m.set_score_of(slot, runs, overs);
        Ok(())
    }

    /// Write a finished match's winner and loser into every destination slot,
    /// overwriting previous occupants, and unlock destinations now complete.
    fn propagate(&mut self, source: &str, winner: &str, loser: &str) {
        let BracketGraph { matches, rules, .. } = self;
        for rule in rules.iter().filter(|r| r.source == source) {
            let team = match rule.outcome {
                Outcome::Winner => winner,
                Outcome::Loser => loser,
            };
            let dest = matches
                .iter_mut()
                .find(|m| m.id == rule.destination)
                .expect("advancement destinations are validated at construction");
            *dest.slot_mut(rule.slot) = Some(team.to_string());
            debug!("{} {:?} -> {} {:?}", team, rule.outcome, dest.id, rule.slot);
            if dest.promote_if_ready() {
                info!("{} unlocked", dest.id);
            }
        }
    }
}

fn check_overs_cap(field: &'static str, overs: Option<Overs>) -> EngineResult<()> {
    match overs {
        Some(o) if o.exceeds_cap() => Err(EngineError::validation(
            field,
            format!("max {} overs allowed, got {o}", super::node::MAX_OVERS),
        )),
        _ => Ok(()),
    }
}

/// Kahn's algorithm over the rule edges.
fn is_acyclic(ids: &HashSet<&str>, rules: &[AdvancementRule]) -> bool {
    let mut indegree: HashMap<&str, usize> = ids.iter().map(|id| (*id, 0)).collect();
    for rule in rules {
        *indegree.entry(rule.destination.as_str()).or_default() += 1;
    }
    let mut ready: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited = 0;
    while let Some(id) = ready.pop_front() {
        visited += 1;
        for rule in rules.iter().filter(|r| r.source == id) {
            if let Some(d) = indegree.get_mut(rule.destination.as_str()) {
                *d -= 1;
                if *d == 0 {
                    ready.push_back(rule.destination.as_str());
                }
            }
        }
    }
    visited == indegree.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::node::Slot;

    fn overs(s: &str) -> Overs {
        s.parse().unwrap()
    }

    fn scores(s1: u32, s2: u32) -> MatchScores {
        MatchScores {
            score1: Some(s1),
            score2: Some(s2),
            overs1: Some(overs("8.0")),
            overs2: Some(overs("7.4")),
        }
    }

    fn status(g: &BracketGraph, id: &str) -> MatchStatus {
        g.get(id).unwrap().status
    }

    fn slot(g: &BracketGraph, id: &str, s: Slot) -> Option<String> {
        g.get(id).unwrap().slot(s).cloned()
    }

    /// Play every match with team1 winning.
    fn play_out(g: &mut BracketGraph) {
        for id in ["M1", "M2", "M3", "E1", "E2", "SF1", "SF2", "FIN"] {
            let m = g.get(id).unwrap();
            let (w, l) = m.contestants().map(|(a, b)| (a.clone(), b.clone())).unwrap();
            g.complete_match(id, &w, &l, scores(100, 90)).unwrap();
        }
    }

    #[test]
    fn standard_layout_starts_with_three_playable_matches() {
        let g = BracketGraph::standard();
        let playable: Vec<_> = g.playable().map(|m| m.id.as_str()).collect();
        assert_eq!(playable, vec!["M1", "M2", "M3"]);
        assert_eq!(status(&g, "FIN"), MatchStatus::Locked);
        assert!(g.champion().is_none());
    }

    #[test]
    fn completing_propagates_winner_and_loser() {
        let mut g = BracketGraph::standard();
        assert!(g.complete_match("M1", "A", "B", scores(120, 100)).unwrap());

        let m1 = g.get("M1").unwrap();
        assert_eq!(m1.status, MatchStatus::Done);
        assert_eq!(m1.winner.as_deref(), Some("A"));
        assert_eq!(m1.loser.as_deref(), Some("B"));
        assert_eq!(m1.score1, Some(120));

        assert_eq!(slot(&g, "SF1", Slot::Team1).as_deref(), Some("A"));
        assert_eq!(slot(&g, "E1", Slot::Team1).as_deref(), Some("B"));
        // Only one slot filled on each: still locked.
        assert_eq!(status(&g, "SF1"), MatchStatus::Locked);
        assert_eq!(status(&g, "E1"), MatchStatus::Locked);
    }

    #[test]
    fn destination_unlocks_when_both_slots_fill() {
        let mut g = BracketGraph::standard();
        g.complete_match("M1", "B", "A", MatchScores::default()).unwrap();
        g.complete_match("M2", "D", "C", MatchScores::default()).unwrap();
        assert_eq!(slot(&g, "E1", Slot::Team1).as_deref(), Some("A"));
        assert_eq!(slot(&g, "E1", Slot::Team2).as_deref(), Some("C"));
        assert_eq!(status(&g, "E1"), MatchStatus::Pending);
        assert_eq!(status(&g, "SF1"), MatchStatus::Locked);
    }

    #[test]
    fn every_rule_lands_its_outcome() {
        let mut g = BracketGraph::standard();
        play_out(&mut g);
        for rule in g.rules().to_vec() {
            let src = g.get(&rule.source).unwrap();
            let expected = match rule.outcome {
                Outcome::Winner => src.winner.clone(),
                Outcome::Loser => src.loser.clone(),
            };
            assert_eq!(slot(&g, &rule.destination, rule.slot), expected, "{rule:?}");
        }
    }

    #[test]
    fn complete_match_is_idempotent() {
        let mut g = BracketGraph::standard();
        g.complete_match("M1", "A", "B", scores(120, 100)).unwrap();
        let once = g.clone();
        assert!(!g.complete_match("M1", "A", "B", scores(120, 100)).unwrap());
        assert_eq!(g, once);
        // Even a conflicting resubmission is ignored.
        assert!(!g.complete_match("M1", "B", "A", scores(1, 2)).unwrap());
        assert_eq!(g, once);
    }

    #[test]
    fn complete_match_rejects_bad_input_without_mutation() {
        let mut g = BracketGraph::standard();
        let before = g.clone();
        assert!(matches!(
            g.complete_match("X9", "A", "B", MatchScores::default()),
            Err(EngineError::NotFound { kind: "match", .. })
        ));
        assert!(matches!(
            g.complete_match("M1", "A", "C", MatchScores::default()),
            Err(EngineError::Validation { field: "winner", .. })
        ));
        assert!(matches!(
            g.complete_match("M1", "A", "A", MatchScores::default()),
            Err(EngineError::Validation { .. })
        ));
        assert!(matches!(
            g.complete_match("SF1", "A", "E", MatchScores::default()),
            Err(EngineError::InvalidState(_))
        ));
        let too_long = MatchScores {
            overs1: Some(overs("9.0")),
            ..scores(100, 90)
        };
        assert!(matches!(
            g.complete_match("M1", "A", "B", too_long),
            Err(EngineError::Validation { field: "overs1", .. })
        ));
        assert_eq!(g, before);
    }

    #[test]
    fn final_crowns_champion() {
        let mut g = BracketGraph::standard();
        play_out(&mut g);
        // team1 always wins, so A takes M1, SF1 and the final.
        assert_eq!(g.get("FIN").unwrap().team2.as_deref(), Some("C"));
        assert_eq!(g.champion().map(String::as_str), Some("A"));
    }

    #[test]
    fn quick_win_computes_loser() {
        let mut g = BracketGraph::standard();
        g.quick_win("M3", "F").unwrap();
        let m = g.get("M3").unwrap();
        assert_eq!(m.winner.as_deref(), Some("F"));
        assert_eq!(m.loser.as_deref(), Some("E"));
        assert_eq!(m.score1, None);
        assert_eq!(slot(&g, "SF1", Slot::Team2).as_deref(), Some("F"));
        assert_eq!(slot(&g, "E2", Slot::Team2).as_deref(), Some("E"));
    }

    #[test]
    fn quick_win_validation() {
        let mut g = BracketGraph::standard();
        assert!(matches!(g.quick_win("E1", "A"), Err(EngineError::InvalidState(_))));
        assert!(matches!(
            g.quick_win("M1", "C"),
            Err(EngineError::Validation { field: "winner", .. })
        ));
        g.quick_win("M1", "A").unwrap();
        assert!(matches!(g.quick_win("M1", "A"), Err(EngineError::InvalidState(_))));
        assert!(matches!(g.quick_win("nope", "A"), Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn admin_override_flips_winner_and_rewrites_downstream() {
        let mut g = BracketGraph::standard();
        g.complete_match("M1", "A", "B", scores(100, 90)).unwrap();
        g.complete_match("M2", "C", "D", scores(100, 90)).unwrap();
        assert_eq!(slot(&g, "SF1", Slot::Team1).as_deref(), Some("A"));
        assert_eq!(slot(&g, "E1", Slot::Team1).as_deref(), Some("B"));

        let changed = g
            .admin_override("M1", 90, 100, overs("8.0"), overs("7.2"))
            .unwrap();
        assert!(changed);
        let m1 = g.get("M1").unwrap();
        assert_eq!(m1.winner.as_deref(), Some("B"));
        assert_eq!(m1.loser.as_deref(), Some("A"));
        assert_eq!((m1.score1, m1.score2), (Some(90), Some(100)));
        assert_eq!(slot(&g, "SF1", Slot::Team1).as_deref(), Some("B"));
        assert_eq!(slot(&g, "E1", Slot::Team1).as_deref(), Some("A"));
        assert_eq!(slot(&g, "E1", Slot::Team2).as_deref(), Some("D"));
        assert_eq!(status(&g, "E1"), MatchStatus::Pending);
    }

    #[test]
    fn admin_override_same_winner_only_updates_scores() {
        let mut g = BracketGraph::standard();
        g.complete_match("M1", "A", "B", scores(100, 90)).unwrap();
        let sf1_before = g.get("SF1").unwrap().clone();
        let changed = g
            .admin_override("M1", 140, 60, overs("8.0"), overs("6.1"))
            .unwrap();
        assert!(!changed);
        let m1 = g.get("M1").unwrap();
        assert_eq!((m1.score1, m1.score2), (Some(140), Some(60)));
        assert_eq!(m1.overs2, Some(overs("6.1")));
        assert_eq!(g.get("SF1").unwrap(), &sf1_before);
    }

    #[test]
    fn admin_override_rejections() {
        let mut g = BracketGraph::standard();
        assert!(matches!(
            g.admin_override("M1", 100, 90, overs("8.0"), overs("8.0")),
            Err(EngineError::InvalidState(_))
        ));
        g.complete_match("M1", "A", "B", scores(100, 90)).unwrap();
        let before = g.clone();
        assert!(matches!(
            g.admin_override("M1", 100, 90, overs("9.0"), overs("8.0")),
            Err(EngineError::Validation { field: "overs1", .. })
        ));
        assert!(matches!(
            g.admin_override("M1", 100, 90, overs("8.0"), overs("8.3")),
            Err(EngineError::Validation { field: "overs2", .. })
        ));
        assert!(matches!(
            g.admin_override("M1", 95, 95, overs("8.0"), overs("8.0")),
            Err(EngineError::Validation { .. })
        ));
        assert!(matches!(
            g.admin_override("Q1", 1, 0, overs("1.0"), overs("1.0")),
            Err(EngineError::NotFound { .. })
        ));
        assert_eq!(g, before);
    }

    #[test]
    fn admin_override_on_final_recomputes_champion() {
        let mut g = BracketGraph::standard();
        play_out(&mut g);
        let fin = g.get("FIN").unwrap().clone();
        g.admin_override("FIN", 80, 81, overs("8.0"), overs("7.5")).unwrap();
        assert_eq!(g.champion(), fin.team2.as_ref());
    }

    #[test]
    fn reset_match_clears_result_and_toss() {
        let mut g = BracketGraph::standard();
        g.set_toss("M2", "D", TossDecision::Bowl).unwrap();
        g.complete_match("M2", "C", "D", scores(77, 60)).unwrap();
        g.reset_match("M2").unwrap();
        let m = g.get("M2").unwrap();
        assert_eq!(m.status, MatchStatus::Pending);
        assert!(m.winner.is_none() && m.loser.is_none());
        assert!(m.score1.is_none() && m.overs2.is_none());
        assert!(m.toss_winner.is_none() && m.toss_decision.is_none());
        // Downstream slots keep the previously propagated teams.
        assert_eq!(slot(&g, "SF2", Slot::Team1).as_deref(), Some("C"));
        assert!(matches!(g.reset_match("ZZ"), Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn reset_final_clears_champion() {
        let mut g = BracketGraph::standard();
        play_out(&mut g);
        assert!(g.champion().is_some());
        g.reset_match("FIN").unwrap();
        assert!(g.champion().is_none());
        assert_eq!(status(&g, "FIN"), MatchStatus::Pending);
    }

    #[test]
    fn reset_unresolved_match_stays_locked() {
        let mut g = BracketGraph::standard();
        g.reset_match("SF2").unwrap();
        assert_eq!(status(&g, "SF2"), MatchStatus::Locked);
    }

    #[test]
    fn set_toss_validation() {
        let mut g = BracketGraph::standard();
        g.set_toss("M1", "B", TossDecision::Bat).unwrap();
        let m = g.get("M1").unwrap();
        assert_eq!(m.toss_winner.as_deref(), Some("B"));
        assert_eq!(m.toss_decision, Some(TossDecision::Bat));

        assert!(matches!(
            g.set_toss("M1", "C", TossDecision::Bat),
            Err(EngineError::Validation { field: "toss_winner", .. })
        ));
        assert!(matches!(
            g.set_toss("SF1", "A", TossDecision::Bat),
            Err(EngineError::InvalidState(_))
        ));
        g.quick_win("M1", "A").unwrap();
        assert!(matches!(
            g.set_toss("M1", "A", TossDecision::Bowl),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn innings_sides_from_toss() {
        let mut g = BracketGraph::standard();
        assert!(matches!(g.innings_sides("M1", 1), Err(EngineError::InvalidState(_))));
        g.set_toss("M1", "A", TossDecision::Bowl).unwrap();
        let first = g.innings_sides("M1", 1).unwrap();
        assert_eq!(first.batting, "B");
        assert_eq!(first.fielding, "A");
        assert_eq!(first.target, None);

        // Second innings needs the first innings total.
        assert!(matches!(g.innings_sides("M1", 2), Err(EngineError::InvalidState(_))));
        g.record_innings_score("M1", "B", 120, overs("8.0")).unwrap();
        let second = g.innings_sides("M1", 2).unwrap();
        assert_eq!(second.batting, "A");
        assert_eq!(second.fielding, "B");
        assert_eq!(second.target, Some(121));

        assert!(matches!(
            g.innings_sides("M1", 3),
            Err(EngineError::Validation { field: "innings", .. })
        ));
    }

    #[test]
    #[should_panic(expected = "unknown match")]
    fn rule_to_missing_match_aborts() {
        let mut rules = standard_rules();
        rules.push(AdvancementRule {
            source: "FIN".into(),
            outcome: Outcome::Winner,
            destination: "GALAXY".into(),
            slot: Slot::Team1,
        });
        BracketGraph::new(standard_matches(), rules, FINAL_MATCH);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn cyclic_rules_abort() {
        let mut rules = standard_rules();
        rules.push(AdvancementRule {
            source: "FIN".into(),
            outcome: Outcome::Loser,
            destination: "M1".into(),
            slot: Slot::Team1,
        });
        BracketGraph::new(standard_matches(), rules, FINAL_MATCH);
    }
}
