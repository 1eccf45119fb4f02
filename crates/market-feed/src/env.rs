// =============================================================================
// Environment settings — case-insensitive, .env-backed, unknown keys ignored
// =============================================================================

/// Knobs read once at startup. Unrecognised environment variables are simply
/// never looked up, matching `pydantic_settings`'s `extra = "ignore"`.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    pub redis_url: String,
    pub bind_addr: String,
    pub http_timeout_secs: u64,
    pub bitget_concurrency: usize,
    pub scan_interval_seconds: f64,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .or_else(|_| std::env::var(name.to_uppercase()))
        .or_else(|_| std::env::var(name.to_lowercase()))
        .ok()
}

impl EnvSettings {
    pub fn load() -> Self {
        let _ = dotenv::dotenv();
        Self {
            redis_url: env_var("redis_url").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            bind_addr: env_var("market_feed_bind_addr").unwrap_or_else(|| "0.0.0.0:8081".to_string()),
            http_timeout_secs: env_var("http_timeout_secs")
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            bitget_concurrency: env_var("bitget_concurrency")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            scan_interval_seconds: env_var("scan_interval_seconds")
                .and_then(|s| s.parse().ok())
                .unwrap_or(30.0),
        }
    }
}
