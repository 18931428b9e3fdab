use anyhow::{Context, Result};
use reqwest::Url;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::videogen::poll::{Clock, PollSettings, TokioClock};
use crate::videogen::replicate::{PredictionApi, ReplicateClient};

/// Shared, read-only application state. Nothing in here changes after
/// startup, so requests never coordinate with each other.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// `None` runs the service in mock mode
    pub provider: Option<Arc<dyn PredictionApi>>,
    pub clock: Arc<dyn Clock>,
    pub poll_settings: PollSettings,
    pub mock_video_url: Url,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let provider = ReplicateClient::from_config(&config)
            .context("Invalid replicate_api_url")?
            .map(|client| Arc::new(client) as Arc<dyn PredictionApi>);

        if provider.is_none() {
            log::warn!("REPLICATE_API_TOKEN is not set, running in mock mode");
        }

        Self::with_provider(config, provider, Arc::new(TokioClock))
    }

    pub fn with_provider(
        config: AppConfig,
        provider: Option<Arc<dyn PredictionApi>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mock_video_url =
            Url::parse(&config.mock_video_url).context("Invalid mock_video_url")?;
        let poll_settings = PollSettings::from(&config);

        Ok(Self {
            config,
            provider,
            clock,
            poll_settings,
            mock_video_url,
        })
    }

    pub fn is_mock_mode(&self) -> bool {
        self.provider.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_mode_without_token() {
        let state = AppState::new(AppConfig::for_tests()).unwrap();
        assert!(state.is_mock_mode());
        assert_eq!(state.poll_settings.retry_limit, 2);
    }

    #[test]
    fn test_live_mode_with_token() {
        let mut conf = AppConfig::for_tests();
        conf.replicate_api_token = Some("r8_live".to_string());
        let state = AppState::new(conf).unwrap();
        assert!(!state.is_mock_mode());
    }

    #[test]
    fn test_invalid_mock_url_is_startup_error() {
        let mut conf = AppConfig::for_tests();
        conf.mock_video_url = "not a url".to_string();
        assert!(AppState::new(conf).is_err());
    }
}
