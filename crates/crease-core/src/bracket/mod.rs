// Knockout bracket: match records, the fixed layout, and the advancement graph.

pub mod graph;
pub mod layout;
pub mod node;

pub use graph::{BracketGraph, InningsSides};
pub use layout::{standard_matches, standard_rules, AdvancementRule, FINAL_MATCH};
pub use node::{
    Match, MatchId, MatchScores, MatchStatus, Outcome, Overs, Slot, TossDecision, BALLS_PER_OVER,
    MAX_OVERS,
};
