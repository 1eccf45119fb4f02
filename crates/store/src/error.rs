// =============================================================================
// Store errors
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("row did not decode into a domain type: {0}")]
    Decode(String),

    #[error("no row found")]
    NotFound,

    #[error("unique constraint violated — row already exists")]
    AlreadyExists,
}

impl StoreError {
    /// Classify a raw `sqlx::Error` as a unique-constraint violation
    /// (Postgres SQLSTATE 23505) versus any other database error. Callers
    /// use this to tell an idempotency collision apart from a transient
    /// failure.
    pub fn from_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return Self::AlreadyExists;
            }
        }
        Self::Db(err)
    }
}
