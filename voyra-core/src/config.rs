use crate::pii::Masked;
use crate::{EngineError, EngineResult};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub quote: QuoteConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: Masked<String>,
    #[serde(default = "default_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Preferred catalog partition for merchant back-office operations.
    pub backoffice_feed_id: Option<String>,
    /// Fallback partition for public-facing contexts.
    pub public_feed_id: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    20
}

impl ProviderConfig {
    /// Resolve the feed id: back-office preferred, public fallback. Absence
    /// of both is a fatal configuration error, surfaced before any external
    /// call is made.
    pub fn feed_id(&self) -> EngineResult<&str> {
        self.backoffice_feed_id
            .as_deref()
            .or(self.public_feed_id.as_deref())
            .ok_or_else(|| {
                EngineError::ConfigurationError("no back-office or public feed id set".to_string())
            })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuoteConfig {
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: i64,
}

fn default_session_ttl_minutes() -> i64 {
    30
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("VOYRA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
