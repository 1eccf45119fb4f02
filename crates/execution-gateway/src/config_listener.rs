// =============================================================================
// Startup config bootstrap + pub/sub hot-swap — shared shape across every
// stage that reads from the runtime config cell.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use aurora_bus::ConfigSubscriber;
use aurora_domain::{ConfigProfile, RuntimeConfigCell, RuntimeConfigState};
use tracing::{error, info, warn};

/// Fetch the current profile from the config service over HTTP, falling back
/// to defaults so a stage can still start against a cold or unreachable
/// config service.
pub async fn bootstrap(client: &reqwest::Client, config_service_url: &str) -> RuntimeConfigState {
    let url = format!("{}/config/current", config_service_url.trim_end_matches('/'));
    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => match resp.json::<ConfigProfile>().await {
            Ok(profile) => {
                info!(version = profile.version, "loaded config profile from config service");
                return RuntimeConfigState::from(&profile);
            }
            Err(e) => warn!(error = %e, "decode config profile failed, using defaults"),
        },
        Ok(resp) => warn!(status = %resp.status(), "config bootstrap fetch failed, using defaults"),
        Err(e) => warn!(error = %e, "config service unreachable, using defaults"),
    }
    RuntimeConfigState::default()
}

/// Run the pub/sub subscriber for the lifetime of the process, replacing
/// `cell` wholesale on every well-formed update. Reconnects with a fixed
/// backoff if the subscription stream drops.
pub async fn run(cell: Arc<RuntimeConfigCell>, redis_url: String) {
    let subscriber = ConfigSubscriber::new(redis_url);
    loop {
        if let Err(e) = subscriber.start(|state| cell.set(state)).await {
            error!(error = %e, "config subscriber stream failed, reconnecting");
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}
