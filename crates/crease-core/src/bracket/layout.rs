// The fixed eight-slot knockout layout: three qualifiers, two eliminators,
// two semi-finals and a final.

use serde::{Deserialize, Serialize};

use super::node::{Match, MatchId, Outcome, Slot};

/// Identifier of the match whose winner is champion.
pub const FINAL_MATCH: &str = "FIN";

/// Where one outcome of a finished match goes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancementRule {
    pub source: MatchId,
    pub outcome: Outcome,
    pub destination: MatchId,
    pub slot: Slot,
}

impl AdvancementRule {
    fn new(source: &str, outcome: Outcome, destination: &str, slot: Slot) -> Self {
        AdvancementRule {
            source: source.to_string(),
            outcome,
            destination: destination.to_string(),
            slot,
        }
    }
}

/// Matches in display order with their initial seeding.
pub fn standard_matches() -> Vec<Match> {
    vec![
        Match::seeded("M1", "Match 1", "A", "B"),
        Match::seeded("M2", "Match 2", "C", "D"),
        Match::seeded("M3", "Match 3", "E", "F"),
        Match::locked("E1", "Eliminator 1"),
        Match::locked("E2", "Eliminator 2"),
        Match::locked("SF1", "Semi Final 1"),
        Match::locked("SF2", "Semi Final 2"),
        Match::locked(FINAL_MATCH, "Final"),
    ]
}

/// Qualifier winners go straight to the semis; qualifier losers fight
/// through the eliminators for the last semi-final place.
pub fn standard_rules() -> Vec<AdvancementRule> {
    use Outcome::{Loser, Winner};
    use Slot::{Team1, Team2};

    vec![
        AdvancementRule::new("M1", Winner, "SF1", Team1),
        AdvancementRule::new("M1", Loser, "E1", Team1),
        AdvancementRule::new("M2", Winner, "SF2", Team1),
        AdvancementRule::new("M2", Loser, "E1", Team2),
        AdvancementRule::new("M3", Winner, "SF1", Team2),
        AdvancementRule::new("M3", Loser, "E2", Team2),
        AdvancementRule::new("E1", Winner, "E2", Team1),
        AdvancementRule::new("E2", Winner, "SF2", Team2),
        AdvancementRule::new("SF1", Winner, FINAL_MATCH, Team1),
        AdvancementRule::new("SF2", Winner, FINAL_MATCH, Team2),
    ]
}
