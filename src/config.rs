use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::consts::{
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_RETRY_LIMIT, DEFAULT_POLL_TIMEOUT_SECS, DEFAULT_PORT,
    DEFAULT_REPLICATE_MODEL_VERSION, MOCK_VIDEO_URL, REPLICATE_API_URL,
};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    /// Absent or empty puts the service in mock mode
    pub replicate_api_token: Option<String>,
    pub replicate_api_url: String,
    pub replicate_model_version: String,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
    /// Consecutive failed status refreshes tolerated before the poll loop gives up
    pub poll_retry_limit: u32,
    pub mock_video_url: String,
    pub sentry_dsn: Option<String>,
    pub sentry_traces_sample_rate: f32,
}

impl AppConfig {
    /// Reads `config.toml` from the working directory if present, then environment
    /// variables (`REPLICATE_API_TOKEN`, `POLL_TIMEOUT_SECS`, ...).
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("port", DEFAULT_PORT as i64)?
            .set_default("replicate_api_url", REPLICATE_API_URL)?
            .set_default("replicate_model_version", DEFAULT_REPLICATE_MODEL_VERSION)?
            .set_default("poll_interval_secs", DEFAULT_POLL_INTERVAL_SECS)?
            .set_default("poll_timeout_secs", DEFAULT_POLL_TIMEOUT_SECS)?
            .set_default("poll_retry_limit", DEFAULT_POLL_RETRY_LIMIT as i64)?
            .set_default("mock_video_url", MOCK_VIDEO_URL)?
            .set_default("sentry_traces_sample_rate", 0.5)
    }

    /// The provider credential, treating an empty value as unset.
    pub fn api_token(&self) -> Option<&str> {
        self.replicate_api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            port: DEFAULT_PORT,
            replicate_api_token: None,
            replicate_api_url: REPLICATE_API_URL.to_string(),
            replicate_model_version: DEFAULT_REPLICATE_MODEL_VERSION.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            poll_retry_limit: DEFAULT_POLL_RETRY_LIMIT,
            mock_video_url: MOCK_VIDEO_URL.to_string(),
            sentry_dsn: None,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_without_sources() {
        let conf: AppConfig = AppConfig::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(conf.port, DEFAULT_PORT);
        assert_eq!(conf.replicate_api_url, REPLICATE_API_URL);
        assert_eq!(conf.poll_interval(), Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS));
        assert_eq!(conf.poll_timeout(), Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS));
        assert_eq!(conf.poll_retry_limit, DEFAULT_POLL_RETRY_LIMIT);
        assert!(conf.replicate_api_token.is_none());
        assert!(conf.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let conf: AppConfig = AppConfig::builder()
            .unwrap()
            .set_override("replicate_api_token", "r8_abc")
            .unwrap()
            .set_override("poll_timeout_secs", 42_u64)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(conf.api_token(), Some("r8_abc"));
        assert_eq!(conf.poll_timeout(), Duration::from_secs(42));
    }

    #[test]
    fn test_blank_token_means_mock_mode() {
        let mut conf = AppConfig::for_tests();
        conf.replicate_api_token = Some("   ".to_string());
        assert_eq!(conf.api_token(), None);

        conf.replicate_api_token = Some(String::new());
        assert_eq!(conf.api_token(), None);
    }
}
