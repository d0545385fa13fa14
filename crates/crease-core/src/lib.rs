// Library root: the tournament engine and its persistence, re-exported for
// the app crate and integration tests.

pub mod bracket;
pub mod db;
pub mod document;
pub mod error;
pub mod roster;
pub mod scoring;
pub mod stats;
pub mod tournament;

pub use error::{EngineError, EngineResult};
pub use tournament::{MatchResult, TournamentState};
