// =============================================================================
// Domain errors
// =============================================================================

use thiserror::Error;

/// Errors raised while constructing or validating domain types.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("missing required field '{0}' in stream entry")]
    MissingField(&'static str),

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("unknown venue '{0}'")]
    UnknownVenue(String),
}
