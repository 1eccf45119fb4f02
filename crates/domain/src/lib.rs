// =============================================================================
// Aurora Domain — shared wire/DB types for the funding-arbitrage pipeline
// =============================================================================
//
// No I/O lives here. Every type is constructed and validated in-process; the
// bus and store crates are responsible for getting bytes in and out.
// =============================================================================

pub mod config;
pub mod error;
pub mod funding;
pub mod opportunity;
pub mod position;
pub mod runtime_config;
pub mod stats;
pub mod totals;
pub mod venue;

pub use config::{ConfigAuditLog, ConfigProfile, RiskLimits, Thresholds};
pub use error::DomainError;
pub use funding::FundingSnapshot;
pub use opportunity::Opportunity;
pub use position::{EventType, LogicReason, PositionEvent, PositionGroup, PositionLeg, Side, Status};
pub use runtime_config::{RuntimeConfigCell, RuntimeConfigState};
pub use stats::StatsSnapshot;
pub use totals::{totals_from_events, Totals};
pub use venue::Venue;
