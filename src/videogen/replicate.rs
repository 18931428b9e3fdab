use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::error::ProviderError;

use super::types::{PredictionInput, PredictionJob};

/// Per-call HTTP timeout. The overall generation budget is enforced by the
/// poll loop, not here.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create and look up predictions on a text-to-video provider.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn create_prediction(&self, input: &PredictionInput)
        -> Result<PredictionJob, ProviderError>;

    async fn get_prediction(&self, id: &str) -> Result<PredictionJob, ProviderError>;
}

#[derive(Serialize)]
struct CreatePredictionRequest<'a> {
    version: &'a str,
    input: &'a PredictionInput,
}

/// Client for the Replicate predictions API
#[derive(Clone)]
pub struct ReplicateClient {
    http_client: reqwest::Client,
    api_url: Url,
    api_token: String,
    model_version: String,
}

impl ReplicateClient {
    pub fn new(api_url: Url, api_token: String, model_version: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url,
            api_token,
            model_version,
        }
    }

    /// `None` when no credential is configured, which puts the service in
    /// mock mode.
    pub fn from_config(conf: &AppConfig) -> anyhow::Result<Option<Self>> {
        let Some(token) = conf.api_token() else {
            return Ok(None);
        };
        let api_url = Url::parse(&conf.replicate_api_url)?;
        Ok(Some(Self::new(
            api_url,
            token.to_string(),
            conf.replicate_model_version.clone(),
        )))
    }

    fn predictions_url(&self) -> String {
        format!("{}/predictions", self.api_url.as_str().trim_end_matches('/'))
    }

    fn prediction_url(&self, id: &str) -> String {
        format!("{}/{}", self.predictions_url(), id)
    }
}

#[async_trait]
impl PredictionApi for ReplicateClient {
    async fn create_prediction(
        &self,
        input: &PredictionInput,
    ) -> Result<PredictionJob, ProviderError> {
        let body = CreatePredictionRequest {
            version: &self.model_version,
            input,
        };

        info!(
            num_frames = input.num_frames,
            "Submitting prediction for prompt: {}",
            input.prompt.chars().take(60).collect::<String>()
        );

        let response = self
            .http_client
            .post(self.predictions_url())
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to submit prediction: {e}");
                ProviderError::Network(format!("Failed to submit prediction: {e}"))
            })?;

        let job = parse_prediction(response).await?;
        info!(prediction_id = %job.id, status = %job.status, "Prediction created");
        Ok(job)
    }

    async fn get_prediction(&self, id: &str) -> Result<PredictionJob, ProviderError> {
        let response = self
            .http_client
            .get(self.prediction_url(id))
            .bearer_auth(&self.api_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!(prediction_id = %id, "Failed to check prediction status: {e}");
                ProviderError::Network(format!("Failed to check prediction status: {e}"))
            })?;

        let job = parse_prediction(response).await?;
        debug!(prediction_id = %job.id, status = %job.status, "Prediction status");
        Ok(job)
    }
}

async fn parse_prediction(response: Response) -> Result<PredictionJob, ProviderError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ProviderError::Network(format!("Failed to read response body: {e}")))?;

    if !status.is_success() {
        error!("Replicate API error: {} - {}", status, text);
        return Err(ProviderError::Api {
            status: status.as_u16(),
            detail: error_detail(&text),
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        error!("Failed to parse prediction response: {e}");
        ProviderError::Decode(format!(
            "Failed to parse prediction response: {e}. Response was: {text}"
        ))
    })
}

/// Replicate errors come back as `{"detail": "..."}` (sometimes with a
/// `title`); anything else is passed through as text.
fn error_detail(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "Unknown error".to_string();
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => ["detail", "error", "title"]
            .iter()
            .find_map(|key| json.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_url: &str) -> ReplicateClient {
        ReplicateClient::new(
            Url::parse(api_url).unwrap(),
            "r8_test".to_string(),
            "v1".to_string(),
        )
    }

    #[test]
    fn test_prediction_urls() {
        let c = client("https://api.replicate.com/v1");
        assert_eq!(c.predictions_url(), "https://api.replicate.com/v1/predictions");
        assert_eq!(
            c.prediction_url("abc"),
            "https://api.replicate.com/v1/predictions/abc"
        );

        let c = client("http://localhost:9000/v1/");
        assert_eq!(c.predictions_url(), "http://localhost:9000/v1/predictions");
    }

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(
            error_detail(r#"{"title":"Invalid version","detail":"The specified version does not exist"}"#),
            "The specified version does not exist"
        );
        assert_eq!(error_detail(r#"{"error":"quota exceeded"}"#), "quota exceeded");
        assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_detail("  "), "Unknown error");
        assert_eq!(error_detail(r#"{"status":500}"#), r#"{"status":500}"#);
    }

    #[test]
    fn test_create_request_shape() {
        let input = PredictionInput {
            prompt: "waves. Style: anime. Aspect ratio: 1:1".to_string(),
            num_frames: 40,
        };
        let body = CreatePredictionRequest {
            version: "v1",
            input: &input,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "version": "v1",
                "input": {"prompt": "waves. Style: anime. Aspect ratio: 1:1", "num_frames": 40}
            })
        );
    }

    #[test]
    fn test_from_config_without_token_is_mock() {
        let conf = AppConfig::for_tests();
        assert!(ReplicateClient::from_config(&conf).unwrap().is_none());

        let mut conf = AppConfig::for_tests();
        conf.replicate_api_token = Some("r8_live".to_string());
        assert!(ReplicateClient::from_config(&conf).unwrap().is_some());
    }
}
