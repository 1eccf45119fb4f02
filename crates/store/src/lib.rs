// =============================================================================
// Aurora Store — sqlx/Postgres repository layer
// =============================================================================
//
// Every query here is runtime-checked (`query_as` against hand-written row
// structs) rather than the compile-time `query!` macro family, since no live
// database is reachable while this crate is built.
// =============================================================================

pub mod config;
pub mod error;
pub mod events;
pub mod pool;
pub mod positions;
pub mod stats;

pub use error::StoreError;
pub use pool::connect;
