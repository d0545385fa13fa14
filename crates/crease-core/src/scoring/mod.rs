// Ball-by-ball scoring.

pub mod delivery;
pub mod session;

pub use delivery::{Delivery, DeliveryKind, DeliveryRecord, Dismissal};
pub use delivery::parse_delivery;
pub use session::{DeliveryOutcome, ScoringSession, ALL_OUT};
