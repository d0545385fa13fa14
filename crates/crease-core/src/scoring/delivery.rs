// A single ball bowled, how it is written on the wire, and how it is logged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

// ---------------------------------------------------------------------------
// Delivery kind
// ---------------------------------------------------------------------------

/// What happened on a ball. Serialized as its scoring token:
/// `"0"`..`"6"`, `"WD"`, `"NB"` or `"W"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeliveryKind {
    Runs(u8),
    Wide,
    NoBall,
    Wicket,
}

impl DeliveryKind {
    /// Counts toward the six balls of an over.
    pub fn is_legal(self) -> bool {
        !matches!(self, DeliveryKind::Wide | DeliveryKind::NoBall)
    }

    pub fn is_wicket(self) -> bool {
        self == DeliveryKind::Wicket
    }

    /// Runs added to the batting total. Wides and no-balls carry a one-run
    /// penalty; a wicket ball scores nothing.
    pub fn runs(self) -> u32 {
        match self {
            DeliveryKind::Runs(n) => u32::from(n),
            DeliveryKind::Wide | DeliveryKind::NoBall => 1,
            DeliveryKind::Wicket => 0,
        }
    }
}

impl fmt::Display for DeliveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryKind::Runs(n) => write!(f, "{n}"),
            DeliveryKind::Wide => f.write_str("WD"),
            DeliveryKind::NoBall => f.write_str("NB"),
            DeliveryKind::Wicket => f.write_str("W"),
        }
    }
}

impl FromStr for DeliveryKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WD" => Ok(DeliveryKind::Wide),
            "NB" => Ok(DeliveryKind::NoBall),
            "W" => Ok(DeliveryKind::Wicket),
            token => match token.parse::<u8>() {
                Ok(n) if n <= 6 => Ok(DeliveryKind::Runs(n)),
                _ => Err(EngineError::validation(
                    "delivery",
                    format!("expected 0-6, WD, NB or W, got {s:?}"),
                )),
            },
        }
    }
}

impl TryFrom<String> for DeliveryKind {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeliveryKind> for String {
    fn from(value: DeliveryKind) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Dismissal
// ---------------------------------------------------------------------------

/// How a batter got out. Only a run out is special: the bowler gets no
/// credit for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dismissal {
    Bowled,
    Caught,
    Lbw,
    RunOut,
    Stumped,
    HitWicket,
}

impl Dismissal {
    pub fn label(self) -> &'static str {
        match self {
            Dismissal::Bowled => "Bowled",
            Dismissal::Caught => "Caught",
            Dismissal::Lbw => "LBW",
            Dismissal::RunOut => "Run Out",
            Dismissal::Stumped => "Stumped",
            Dismissal::HitWicket => "Hit Wicket",
        }
    }

    pub fn credits_bowler(self) -> bool {
        self != Dismissal::RunOut
    }
}

impl fmt::Display for Dismissal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Dismissal {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "bowled" => Ok(Dismissal::Bowled),
            "caught" => Ok(Dismissal::Caught),
            "lbw" => Ok(Dismissal::Lbw),
            "runout" => Ok(Dismissal::RunOut),
            "stumped" => Ok(Dismissal::Stumped),
            "hitwicket" => Ok(Dismissal::HitWicket),
            _ => Err(EngineError::validation(
                "dismissal",
                format!("unknown dismissal {s:?}"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// A ball as submitted by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    kind: DeliveryKind,
    dismissal: Option<Dismissal>,
    non_striker_out: bool,
}

impl Delivery {
    pub fn new(kind: DeliveryKind) -> Self {
        Delivery {
            kind,
            dismissal: None,
            non_striker_out: false,
        }
    }

    /// A wicket, optionally saying how.
    pub fn wicket(dismissal: Option<Dismissal>) -> Self {
        Delivery {
            kind: DeliveryKind::Wicket,
            dismissal,
            non_striker_out: false,
        }
    }

    /// A run out at the bowler's end: the non-striker is dismissed while the
    /// striker is still charged the ball.
    pub fn run_out_non_striker() -> Self {
        Delivery {
            kind: DeliveryKind::Wicket,
            dismissal: Some(Dismissal::RunOut),
            non_striker_out: true,
        }
    }

    pub fn kind(&self) -> DeliveryKind {
        self.kind
    }

    pub fn dismissal(&self) -> Option<Dismissal> {
        self.dismissal
    }

    pub fn non_striker_out(&self) -> bool {
        self.non_striker_out
    }

    /// Label recorded against the dismissed batter.
    pub fn dismissal_label(&self) -> &'static str {
        self.dismissal.map_or("Out", Dismissal::label)
    }

    pub fn credits_bowler(&self) -> bool {
        self.kind.is_wicket() && self.dismissal.map_or(true, Dismissal::credits_bowler)
    }
}

impl FromStr for Delivery {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Delivery::new(s.parse()?))
    }
}

/// One entry of an over log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    #[serde(rename = "type")]
    pub kind: DeliveryKind,
    pub runs: u32,
    pub extra: bool,
    /// Position within the over, 1-6; `None` for wides and no-balls.
    pub ball: Option<u32>,
}

/// Build a delivery from its scoring token and an optional dismissal name.
pub fn parse_delivery(token: &str, dismissal: Option<&str>) -> EngineResult<Delivery> {
    let kind: DeliveryKind = token.parse()?;
    match dismissal {
        None => Ok(Delivery::new(kind)),
        Some(how) if kind.is_wicket() => Ok(Delivery::wicket(Some(how.parse()?))),
        Some(_) => Err(EngineError::validation(
            "dismissal",
            format!("a dismissal needs a wicket ball, got {kind}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_parse() {
        assert_eq!("0".parse::<DeliveryKind>().unwrap(), DeliveryKind::Runs(0));
        assert_eq!("6".parse::<DeliveryKind>().unwrap(), DeliveryKind::Runs(6));
        assert_eq!("wd".parse::<DeliveryKind>().unwrap(), DeliveryKind::Wide);
        assert_eq!("NB".parse::<DeliveryKind>().unwrap(), DeliveryKind::NoBall);
        assert_eq!("W".parse::<DeliveryKind>().unwrap(), DeliveryKind::Wicket);
    }

    #[test]
    fn unknown_tokens_rejected() {
        for bad in ["7", "-1", "LB", "", "four"] {
            assert!(
                matches!(
                    bad.parse::<DeliveryKind>(),
                    Err(EngineError::Validation { field: "delivery", .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn classification() {
        assert!(DeliveryKind::Runs(3).is_legal());
        assert!(DeliveryKind::Wicket.is_legal());
        assert!(!DeliveryKind::Wide.is_legal());
        assert!(!DeliveryKind::NoBall.is_legal());
        assert_eq!(DeliveryKind::Wide.runs(), 1);
        assert_eq!(DeliveryKind::Wicket.runs(), 0);
        assert_eq!(DeliveryKind::Runs(4).runs(), 4);
    }

    #[test]
    fn dismissal_labels_and_credit() {
        assert_eq!(Delivery::wicket(None).dismissal_label(), "Out");
        assert!(Delivery::wicket(None).credits_bowler());
        assert_eq!("run out".parse::<Dismissal>().unwrap(), Dismissal::RunOut);
        assert_eq!("Hit-Wicket".parse::<Dismissal>().unwrap(), Dismissal::HitWicket);
        assert!(!Delivery::wicket(Some(Dismissal::RunOut)).credits_bowler());
        assert!(Delivery::wicket(Some(Dismissal::Caught)).credits_bowler());
        assert!(!Delivery::new(DeliveryKind::Runs(1)).credits_bowler());
    }

    #[test]
    fn parse_delivery_pairs_dismissal_with_wicket() {
        let d = parse_delivery("W", Some("lbw")).unwrap();
        assert_eq!(d.dismissal(), Some(Dismissal::Lbw));
        assert!(parse_delivery("4", Some("caught")).is_err());
        assert!(parse_delivery("W", Some("timed out")).is_err());
    }

    #[test]
    fn record_serializes_with_type_token() {
        let rec = DeliveryRecord {
            kind: DeliveryKind::Wide,
            runs: 1,
            extra: true,
            ball: None,
        };
        let json = serde_json::to_value(rec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "WD", "runs": 1, "extra": true, "ball": null})
        );
    }
}
