// =============================================================================
// Config pub/sub — hot-swap notifications and best-effort audit fan-out
// =============================================================================

use aurora_domain::RuntimeConfigState;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::BusError;

pub const CONFIG_UPDATES_CHANNEL: &str = "config:updates";
pub const CONFIG_AUDIT_CHANNEL: &str = "config:audit";

/// Publishes configuration changes. Owned by the config service.
#[derive(Clone)]
pub struct ConfigNotifier {
    conn: ConnectionManager,
}

impl ConfigNotifier {
    pub async fn connect(redis_url: &str) -> Result<Self, BusError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Publish the new runtime state to every subscribed stage. Delivery is
    /// fire-and-forget — a stage that misses the message keeps running on
    /// its last-known config until its next bootstrap fetch.
    pub async fn publish_update(&self, state: &RuntimeConfigState) -> Result<(), BusError> {
        let payload = serde_json::to_string(state).expect("RuntimeConfigState always serialises");
        let mut conn = self.conn.clone();
        let _: i64 = conn.publish(CONFIG_UPDATES_CHANNEL, payload).await?;
        Ok(())
    }

    /// Publish a human-facing audit record alongside the machine-facing
    /// update. No stage subscribes to this by default; it exists for an
    /// external operator-facing collaborator.
    pub async fn publish_audit<T: Serialize>(&self, audit: &T) -> Result<(), BusError> {
        let payload = serde_json::to_string(audit).expect("audit payload always serialises");
        let mut conn = self.conn.clone();
        let _: i64 = conn.publish(CONFIG_AUDIT_CHANNEL, payload).await?;
        Ok(())
    }
}

/// Subscribes to `config:updates` and invokes a handler for each message.
/// Owned by every non-config-service stage.
pub struct ConfigSubscriber {
    redis_url: String,
}

impl ConfigSubscriber {
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
        }
    }

    /// Subscribe and run `handler` for every well-formed update for the
    /// lifetime of the process. Reconnects are the caller's responsibility
    /// (wrap in a retry loop, as every stage's `main` does).
    pub async fn start<F>(&self, mut handler: F) -> Result<(), BusError>
    where
        F: FnMut(RuntimeConfigState),
    {
        let client = redis::Client::open(self.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(CONFIG_UPDATES_CHANNEL).await?;

        let mut stream = pubsub.on_message();
        while let Some(msg) = stream.next().await {
            let payload: String = match msg.get_payload() {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "config update message had non-string payload");
                    continue;
                }
            };
            match serde_json::from_str::<RuntimeConfigState>(&payload) {
                Ok(state) => handler(state),
                Err(e) => warn!(error = %e, "failed to parse config update payload"),
            }
        }
        debug!("config subscriber stream ended");
        Ok(())
    }
}
