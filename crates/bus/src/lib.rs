// =============================================================================
// Aurora Bus — Redis stream + consumer-group + pub/sub wrapper
// =============================================================================

pub mod error;
pub mod pubsub;
pub mod stream;

pub use error::BusError;
pub use pubsub::{ConfigNotifier, ConfigSubscriber};
pub use stream::{FUNDING_STREAM, OPPORTUNITY_CONSUMER_GROUP, OPPORTUNITY_STREAM, StreamBus};

/// Approximate trim target passed to Redis `XADD ... MAXLEN ~`.
pub const DEFAULT_STREAM_MAXLEN: usize = 1000;
