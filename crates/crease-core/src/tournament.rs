// Tournament context: owns the bracket, the roster, the live session and the
// document store, and persists after every successful change.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::bracket::{BracketGraph, MatchScores, Overs, TossDecision};
use crate::db::DocumentStore;
use crate::document::Document;
use crate::error::{EngineError, EngineResult};
use crate::roster::{Player, Role, Roster, TeamId};
use crate::scoring::{Delivery, DeliveryOutcome, ScoringSession};

/// A decided match, ready to be recorded in the bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub winner: TeamId,
    pub loser: TeamId,
    pub scores: MatchScores,
}

/// The whole tournament.
///
/// Every mutating method either succeeds and saves, or fails with an
/// [`EngineError`] and leaves everything exactly as it was. A failed save is
/// logged and otherwise ignored: the in-memory state stays authoritative.
///
/// If the store holds a document that cannot be read, play starts from the
/// defaults but nothing is saved over that document until it is replaced on
/// purpose with [`reset_tournament`](Self::reset_tournament),
/// [`import_document`](Self::import_document) or
/// [`clear_store`](Self::clear_store).
pub struct TournamentState {
    bracket: BracketGraph,
    roster: Roster,
    session: Option<ScoringSession>,
    store: Box<dyn DocumentStore + Send>,
    saves_held: bool,
}

impl TournamentState {
    /// A fresh tournament. Nothing is saved until the first change.
    pub fn new(store: Box<dyn DocumentStore + Send>) -> Self {
        TournamentState {
            bracket: BracketGraph::standard(),
            roster: Roster::default(),
            session: None,
            store,
            saves_held: false,
        }
    }

    /// Resume whatever the store holds, or start fresh.
    pub fn load(store: Box<dyn DocumentStore + Send>) -> Self {
        match store.load() {
            Ok(Some(doc)) => {
                info!("Resuming saved tournament");
                Self::from_document(doc, store)
            }
            Ok(None) => {
                info!("No saved tournament, starting fresh");
                Self::new(store)
            }
            Err(e) => {
                warn!(
                    "Failed to load saved tournament, starting fresh and leaving it in place: {:#}",
                    e
                );
                let mut state = Self::new(store);
                state.saves_held = true;
                state
            }
        }
    }

    fn from_document(doc: Document, store: Box<dyn DocumentStore + Send>) -> Self {
        let (bracket, roster, session) = doc.into_parts();
        TournamentState {
            bracket,
            roster,
            session,
            store,
            saves_held: false,
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn bracket(&self) -> &BracketGraph {
        &self.bracket
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn session(&self) -> Option<&ScoringSession> {
        self.session.as_ref()
    }

    pub fn champion(&self) -> Option<&TeamId> {
        self.bracket.champion()
    }

    pub fn player(&self, team_id: &str, player_id: &str) -> Option<&Player> {
        self.roster.player(team_id, player_id)
    }

    /// Whether saving is held back because the stored document was unreadable.
    pub fn saves_held(&self) -> bool {
        self.saves_held
    }

    /// When the store last took a save, if it knows.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        match self.store.saved_at() {
            Ok(at) => at,
            Err(e) => {
                warn!("Failed to read save time: {:#}", e);
                None
            }
        }
    }

    /// Snapshot of the current state.
    pub fn document(&self) -> Document {
        Document::snapshot(&self.bracket, &self.roster, self.session.as_ref())
    }

    fn persist(&self) {
        if self.saves_held {
            warn!("Not saving: the stored tournament is unreadable and has not been replaced");
            return;
        }
        if let Err(e) = self.store.save(&self.document()) {
            warn!("Failed to save tournament: {:#}", e);
        }
    }

    /// Forget the session if it belongs to `match_id`.
    fn drop_session_for(&mut self, match_id: &str) {
        if self.session.as_ref().is_some_and(|s| s.match_id == match_id) {
            debug!("Discarding scoring session for {}", match_id);
            self.session = None;
        }
    }

    // ------------------------------------------------------------------
    // Bracket
    // ------------------------------------------------------------------

    /// Record a result. Returns `false` if the match was already done.
    pub fn complete_match(
        &mut self,
        match_id: &str,
        winner: &str,
        loser: &str,
        scores: MatchScores,
    ) -> EngineResult<bool> {
        let applied = self
            .bracket
            .complete_match(match_id, winner, loser, scores)?;
        if applied {
            self.drop_session_for(match_id);
            self.persist();
        }
        Ok(applied)
    }

    pub fn reset_match(&mut self, match_id: &str) -> EngineResult<()> {
        self.bracket.reset_match(match_id)?;
        self.drop_session_for(match_id);
        self.persist();
        Ok(())
    }

    /// Correct a finished match's scores. Returns whether the winner changed.
    pub fn admin_override(
        &mut self,
        match_id: &str,
        score1: u32,
        score2: u32,
        overs1: Overs,
        overs2: Overs,
    ) -> EngineResult<bool> {
        let changed = self
            .bracket
            .admin_override(match_id, score1, score2, overs1, overs2)?;
        self.persist();
        Ok(changed)
    }

    pub fn set_toss(
        &mut self,
        match_id: &str,
        toss_winner: &str,
        decision: TossDecision,
    ) -> EngineResult<()> {
        self.bracket.set_toss(match_id, toss_winner, decision)?;
        self.persist();
        Ok(())
    }

    pub fn quick_win(&mut self, match_id: &str, winner: &str) -> EngineResult<()> {
        self.bracket.quick_win(match_id, winner)?;
        self.drop_session_for(match_id);
        self.persist();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scoring
    // ------------------------------------------------------------------

    /// Open a scoring session for one innings of a match and mark it live.
    /// Any session already open is replaced.
    pub fn start_session(&mut self, match_id: &str, innings: u8) -> EngineResult<()> {
        let sides = self.bracket.innings_sides(match_id, innings)?;
        let session = ScoringSession::start(match_id, innings, sides, &self.roster)?;
        self.bracket.mark_live(match_id)?;
        if let Some(old) = self.session.replace(session) {
            debug!(
                "Replaced scoring session for {} innings {}",
                old.match_id, old.innings
            );
        }
        info!("{} innings {} underway", match_id, innings);
        self.persist();
        Ok(())
    }

    /// Score one ball. Returns `None` when the innings is already over.
    pub fn apply_delivery(&mut self, delivery: &Delivery) -> EngineResult<Option<DeliveryOutcome>> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| EngineError::invalid_state("no innings is being scored"))?;
        let outcome = session.apply(delivery, &mut self.roster)?;
        if outcome.is_some() {
            self.persist();
        }
        Ok(outcome)
    }

    pub fn set_bowler(&mut self, player_id: &str) -> EngineResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| EngineError::invalid_state("no innings is being scored"))?;
        session.set_bowler(player_id, &self.roster)?;
        self.persist();
        Ok(())
    }

    /// Close the session, recording `result` for its match when given.
    pub fn finish_innings(&mut self, result: Option<MatchResult>) -> EngineResult<()> {
        let match_id = self
            .session
            .as_ref()
            .map(|s| s.match_id.clone())
            .ok_or_else(|| EngineError::invalid_state("no innings is being scored"))?;
        if let Some(result) = result {
            self.bracket
                .complete_match(&match_id, &result.winner, &result.loser, result.scores)?;
        }
        self.session = None;
        self.persist();
        Ok(())
    }

    /// Bank the first innings total and start the chase.
    pub fn start_second_innings(&mut self) -> EngineResult<()> {
        let first = match &self.session {
            Some(s) if s.innings == 1 && s.complete => s,
            Some(s) if s.innings == 1 => {
                return Err(EngineError::invalid_state(format!(
                    "first innings of {} is still in progress",
                    s.match_id
                )))
            }
            _ => {
                return Err(EngineError::invalid_state(
                    "no completed first innings to follow",
                ))
            }
        };

        let mut bracket = self.bracket.clone();
        bracket.record_innings_score(
            &first.match_id,
            &first.batting_team,
            first.runs,
            first.overs_bowled(),
        )?;
        let sides = bracket.innings_sides(&first.match_id, 2)?;
        let second = ScoringSession::start(&first.match_id, 2, sides, &self.roster)?;
        info!(
            "{} target set: {}",
            second.match_id,
            second.target.unwrap_or_default()
        );

        self.bracket = bracket;
        self.session = Some(second);
        self.persist();
        Ok(())
    }

    /// Decide a match from a finished chase and record it.
    pub fn finish_match(&mut self) -> EngineResult<MatchResult> {
        let chase = match &self.session {
            Some(s) if s.innings == 2 && s.complete => s,
            Some(s) if s.innings == 2 => {
                return Err(EngineError::invalid_state(format!(
                    "chase in {} is still in progress",
                    s.match_id
                )))
            }
            _ => {
                return Err(EngineError::invalid_state(
                    "no completed second innings to finish",
                ))
            }
        };

        let mut m = self
            .bracket
            .get(&chase.match_id)
            .cloned()
            .ok_or_else(|| EngineError::match_not_found(&chase.match_id))?;
        let (defended, _) = m.score_of(&chase.fielding_team).ok_or_else(|| {
            EngineError::invalid_state(format!(
                "first innings score for {} is missing",
                chase.match_id
            ))
        })?;
        if chase.runs == defended {
            return Err(EngineError::validation(
                "scores",
                format!(
                    "{} finished level on {}; settle it with a quick win",
                    chase.match_id, defended
                ),
            ));
        }
        let slot = m.slot_of(&chase.batting_team).ok_or_else(|| {
            EngineError::invalid_state(format!(
                "{} is not playing {}",
                chase.batting_team, chase.match_id
            ))
        })?;
        m.set_score_of(slot, chase.runs, chase.overs_bowled());

        let (winner, loser) = if chase.runs > defended {
            (chase.batting_team.clone(), chase.fielding_team.clone())
        } else {
            (chase.fielding_team.clone(), chase.batting_team.clone())
        };
        let result = MatchResult {
            winner,
            loser,
            scores: m.scores(),
        };
        self.finish_innings(Some(result.clone()))?;
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Roster and lifecycle
    // ------------------------------------------------------------------

    pub fn update_player(
        &mut self,
        team_id: &str,
        player_id: &str,
        name: Option<&str>,
        role: Option<Role>,
    ) -> EngineResult<()> {
        self.roster.update_player(team_id, player_id, name, role)?;
        self.persist();
        Ok(())
    }

    /// Start the tournament over: layout, squads and figures.
    pub fn reset_tournament(&mut self) {
        self.bracket = BracketGraph::standard();
        self.roster = Roster::default();
        self.session = None;
        self.saves_held = false;
        info!("Tournament reset");
        self.persist();
    }

    /// Replace everything with a document from elsewhere, such as a backup.
    pub fn import_document(&mut self, doc: Document) {
        let (bracket, roster, session) = doc.into_parts();
        self.bracket = bracket;
        self.roster = roster;
        self.session = session;
        self.saves_held = false;
        info!("Tournament replaced from imported document");
        self.persist();
    }

    /// Delete the saved copy. In-memory state is untouched.
    pub fn clear_store(&mut self) -> anyhow::Result<()> {
        self.store.clear()?;
        self.saves_held = false;
        Ok(())
    }
}
