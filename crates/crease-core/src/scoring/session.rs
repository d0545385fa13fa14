// Live scoring session for one innings: the per-delivery state machine.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::delivery::{Delivery, DeliveryRecord};
use crate::bracket::{InningsSides, MatchId, Overs, BALLS_PER_OVER, MAX_OVERS};
use crate::error::{EngineError, EngineResult};
use crate::roster::{PlayerId, Roster, TeamId, SQUAD_SIZE};

/// Wickets that end an innings.
pub const ALL_OUT: u32 = SQUAD_SIZE as u32 - 1;

/// What a single applied delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub record: DeliveryRecord,
    pub over_completed: bool,
    /// The batter dismissed on this ball.
    pub dismissed: Option<PlayerId>,
    pub innings_complete: bool,
}

/// The innings currently being scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSession {
    pub match_id: MatchId,
    pub innings: u8,
    pub batting_team: TeamId,
    pub fielding_team: TeamId,
    pub runs: u32,
    pub wickets: u32,
    /// Completed overs.
    pub overs: u32,
    /// Legal balls into the current over.
    pub balls: u32,
    pub target: Option<u32>,
    pub complete: bool,
    pub striker: PlayerId,
    pub non_striker: PlayerId,
    pub bowler: PlayerId,
    #[serde(default, rename = "currentOverDeliveries")]
    pub current_over: Vec<DeliveryRecord>,
    #[serde(default)]
    pub over_history: Vec<Vec<DeliveryRecord>>,
    /// Batters out in this innings, in order of dismissal.
    #[serde(default)]
    pub dismissed: Vec<PlayerId>,
}

impl ScoringSession {
    /// Open an innings: the first two in the batting order take guard and the
    /// last player of the fielding side opens the bowling.
    pub(crate) fn start(
        match_id: &str,
        innings: u8,
        sides: InningsSides,
        roster: &Roster,
    ) -> EngineResult<Self> {
        let striker = roster.slot(&sides.batting, 0)?.id.clone();
        let non_striker = roster.slot(&sides.batting, 1)?.id.clone();
        let bowler = roster.slot(&sides.fielding, SQUAD_SIZE - 1)?.id.clone();

        Ok(ScoringSession {
            match_id: match_id.to_string(),
            innings,
            batting_team: sides.batting,
            fielding_team: sides.fielding,
            runs: 0,
            wickets: 0,
            overs: 0,
            balls: 0,
            target: sides.target,
            complete: false,
            striker,
            non_striker,
            bowler,
            current_over: Vec::new(),
            over_history: Vec::new(),
            dismissed: Vec::new(),
        })
    }

    /// Overs bowled so far, as `o.b`.
    pub fn overs_bowled(&self) -> Overs {
        Overs::from_legal_balls(self.overs * BALLS_PER_OVER + self.balls)
    }

    /// Runs still needed in a chase.
    pub fn runs_needed(&self) -> Option<u32> {
        self.target.map(|t| t.saturating_sub(self.runs))
    }

    /// Apply one ball. A finished innings ignores further deliveries and
    /// returns `None`.
    pub(crate) fn apply(
        &mut self,
        delivery: &Delivery,
        roster: &mut Roster,
    ) -> EngineResult<Option<DeliveryOutcome>> {
        if self.complete {
            debug!("Innings complete, ignoring {}", delivery.kind());
            return Ok(None);
        }

        let kind = delivery.kind();
        let legal = kind.is_legal();
        let wicket = kind.is_wicket();
        let runs = kind.runs();

        self.runs += runs;

        if let Some(batter) = roster.player_mut(&self.batting_team, &self.striker) {
            let figures = &mut batter.batting;
            if wicket {
                figures.balls_faced += 1;
            } else if legal {
                figures.runs += runs;
                figures.balls_faced += 1;
                match runs {
                    4 => figures.fours += 1,
                    6 => figures.sixes += 1,
                    _ => {}
                }
            }
        }

        if let Some(bowler) = roster.player_mut(&self.fielding_team, &self.bowler) {
            let figures = &mut bowler.bowling;
            figures.runs_conceded += runs;
            if legal {
                figures.balls_in_over += 1;
            } else {
                figures.extras_conceded += 1;
            }
        }

        let record = DeliveryRecord {
            kind,
            runs,
            extra: !legal,
            ball: legal.then_some(self.balls + 1),
        };
        self.current_over.push(record);

        let mut over_completed = false;
        if legal {
            self.balls += 1;
            if self.balls == BALLS_PER_OVER {
                over_completed = true;
                self.close_over(roster);
            }
        }

        let mut dismissed = None;
        if wicket {
            dismissed = Some(self.take_wicket(delivery, roster));
        } else if legal && runs % 2 == 1 {
            self.swap_strike();
        }

        if over_completed {
            self.swap_strike();
        }

        self.complete = self.wickets >= ALL_OUT
            || (self.overs >= MAX_OVERS && self.balls == 0)
            || self.target.is_some_and(|t| self.runs >= t);

        debug!(
            "{} innings {}: {} -> {}/{} ({})",
            self.match_id,
            self.innings,
            kind,
            self.runs,
            self.wickets,
            self.overs_bowled()
        );
        if self.complete {
            info!(
                "{} innings {} complete: {} {}/{} in {} overs",
                self.match_id,
                self.innings,
                self.batting_team,
                self.runs,
                self.wickets,
                self.overs_bowled()
            );
        }

        Ok(Some(DeliveryOutcome {
            record,
            over_completed,
            dismissed,
            innings_complete: self.complete,
        }))
    }

    fn close_over(&mut self, roster: &mut Roster) {
        self.overs += 1;
        self.balls = 0;
        if let Some(bowler) = roster.player_mut(&self.fielding_team, &self.bowler) {
            bowler.bowling.overs_completed += 1;
            bowler.bowling.balls_in_over = 0;
        }
        self.over_history.push(std::mem::take(&mut self.current_over));
    }

    /// Record a dismissal and send in the next batter. Returns who is out.
    fn take_wicket(&mut self, delivery: &Delivery, roster: &mut Roster) -> PlayerId {
        self.wickets += 1;
        let out = if delivery.non_striker_out() {
            self.non_striker.clone()
        } else {
            self.striker.clone()
        };

        if let Some(batter) = roster.player_mut(&self.batting_team, &out) {
            batter.batting.is_out = true;
            batter.batting.dismissal = delivery.dismissal_label().to_string();
        }
        if delivery.credits_bowler() {
            if let Some(bowler) = roster.player_mut(&self.fielding_team, &self.bowler) {
                bowler.bowling.wickets_taken += 1;
            }
        }
        self.dismissed.push(out.clone());

        if let Some(next) = self.next_batter(roster) {
            if delivery.non_striker_out() {
                self.non_striker = next;
            } else {
                self.striker = next;
            }
        }
        out
    }

    /// First batter in order who is neither at the crease nor already out.
    fn next_batter(&self, roster: &Roster) -> Option<PlayerId> {
        roster
            .squad(&self.batting_team)?
            .iter()
            .find(|p| {
                p.id != self.striker && p.id != self.non_striker && !self.dismissed.contains(&p.id)
            })
            .map(|p| p.id.clone())
    }

    fn swap_strike(&mut self) {
        std::mem::swap(&mut self.striker, &mut self.non_striker);
    }

    /// Change the bowler. Any fielder may bowl, including the previous
    /// over's bowler.
    pub(crate) fn set_bowler(&mut self, player_id: &str, roster: &Roster) -> EngineResult<()> {
        if roster.player(&self.fielding_team, player_id).is_none() {
            return Err(EngineError::player_not_found(player_id));
        }
        self.bowler = player_id.to_string();
        Ok(())
    }
}
