// =============================================================================
// Bus errors
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("domain decode error: {0}")]
    Domain(#[from] aurora_domain::DomainError),
}
