// Typed failures returned by every tournament operation.

use thiserror::Error;

/// Why an engine operation was rejected.
///
/// A rejected operation never leaves a partial mutation behind: the state is
/// exactly what it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("validation error for `{field}`: {message}")]
    Validation { field: &'static str, message: String },
}

impl EngineError {
    pub(crate) fn match_not_found(id: &str) -> Self {
        EngineError::NotFound {
            kind: "match",
            id: id.to_string(),
        }
    }

    pub(crate) fn player_not_found(id: &str) -> Self {
        EngineError::NotFound {
            kind: "player",
            id: id.to_string(),
        }
    }

    pub(crate) fn team_not_found(id: &str) -> Self {
        EngineError::NotFound {
            kind: "team",
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        EngineError::InvalidState(message.into())
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_explain_the_rejection() {
        assert_eq!(
            EngineError::match_not_found("Q9").to_string(),
            "match not found: Q9"
        );
        assert_eq!(
            EngineError::invalid_state("match already done").to_string(),
            "invalid state: match already done"
        );
        assert_eq!(
            EngineError::validation("overs1", "max 8 overs allowed").to_string(),
            "validation error for `overs1`: max 8 overs allowed"
        );
    }
}
