// =============================================================================
// Environment settings — case-insensitive, .env-backed, unknown keys ignored
// =============================================================================

#[derive(Debug, Clone)]
pub struct EnvSettings {
    pub redis_url: String,
    pub config_service_url: String,
    pub http_timeout_secs: u64,
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
            config_service_url: env_var("config_service_url")
                .unwrap_or_else(|| "http://127.0.0.1:8085".to_string()),
            http_timeout_secs: env_var("http_timeout_secs")
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}
