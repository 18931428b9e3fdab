//! Submit one prediction and follow it to a terminal state.
//!
//! ```text
//! Submitting ──▶ Polling ──▶ Succeeded
//!     │             │   └──▶ Failed
//!     │             └──────▶ TimedOut (reported as Failed)
//!     └──▶ Mock (no credential) / Failed (submission rejected)
//! ```
//!
//! The timeout guard runs before every wait. The remote prediction is never
//! cancelled; on timeout we simply stop asking about it.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{ProviderError, VideoGenError};

use super::replicate::PredictionApi;
use super::types::{GenerationRequest, PredictionInput, PredictionJob, PredictionStatus};

/// Source of time for the poll loop
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
    /// Consecutive failed status refreshes tolerated before giving up
    pub retry_limit: u32,
}

impl From<&AppConfig> for PollSettings {
    fn from(conf: &AppConfig) -> Self {
        Self {
            interval: conf.poll_interval(),
            timeout: conf.poll_timeout(),
            retry_limit: conf.poll_retry_limit,
        }
    }
}

/// Terminal state of one generation
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Mock,
    Succeeded {
        prediction_id: String,
        video_url: Url,
    },
    Failed {
        prediction_id: Option<String>,
        error: VideoGenError,
    },
}

enum PollState {
    Submitting,
    Polling {
        job: PredictionJob,
        started_at: Instant,
        failed_refreshes: u32,
    },
    Finished(PollOutcome),
}

pub struct PollLoop<'a> {
    api: Option<&'a dyn PredictionApi>,
    clock: &'a dyn Clock,
    settings: PollSettings,
}

impl<'a> PollLoop<'a> {
    /// `api` is `None` in mock mode.
    pub fn new(
        api: Option<&'a dyn PredictionApi>,
        clock: &'a dyn Clock,
        settings: PollSettings,
    ) -> Self {
        Self {
            api,
            clock,
            settings,
        }
    }

    pub async fn run(&self, request: &GenerationRequest) -> PollOutcome {
        let Some(api) = self.api else {
            info!("No provider credential configured, returning mock video");
            return PollOutcome::Mock;
        };

        let input = PredictionInput::from(request);
        let mut state = PollState::Submitting;

        loop {
            state = match state {
                PollState::Submitting => self.submit(api, &input).await,
                PollState::Polling {
                    job,
                    started_at,
                    failed_refreshes,
                } => self.poll(api, job, started_at, failed_refreshes).await,
                PollState::Finished(outcome) => return outcome,
            };
        }
    }

    async fn submit(&self, api: &dyn PredictionApi, input: &PredictionInput) -> PollState {
        match api.create_prediction(input).await {
            Ok(job) => PollState::Polling {
                job,
                started_at: self.clock.now(),
                failed_refreshes: 0,
            },
            Err(e) => {
                warn!("Prediction submission failed: {e}");
                PollState::Finished(PollOutcome::Failed {
                    prediction_id: None,
                    error: VideoGenError::ProviderSubmission(e.detail().to_string()),
                })
            }
        }
    }

    async fn poll(
        &self,
        api: &dyn PredictionApi,
        job: PredictionJob,
        started_at: Instant,
        failed_refreshes: u32,
    ) -> PollState {
        if !job.status.is_pending() {
            return PollState::Finished(conclude(job, None));
        }

        let elapsed = self.clock.now().saturating_duration_since(started_at);
        if elapsed > self.settings.timeout {
            warn!(
                prediction_id = %job.id,
                elapsed_secs = elapsed.as_secs(),
                "Prediction still {} at deadline, abandoning it",
                job.status
            );
            return PollState::Finished(PollOutcome::Failed {
                prediction_id: Some(job.id),
                error: VideoGenError::Timeout(self.settings.timeout.as_secs()),
            });
        }

        self.clock.sleep(self.settings.interval).await;

        match api.get_prediction(&job.id).await {
            Ok(next) => {
                if next.status.is_pending() && next.status != job.status {
                    info!(prediction_id = %next.id, status = %next.status, "Prediction progressed");
                }
                PollState::Polling {
                    job: next,
                    started_at,
                    failed_refreshes: 0,
                }
            }
            Err(e) if failed_refreshes < self.settings.retry_limit => {
                warn!(
                    prediction_id = %job.id,
                    attempt = failed_refreshes + 1,
                    "Status refresh failed, will retry: {e}"
                );
                PollState::Polling {
                    job,
                    started_at,
                    failed_refreshes: failed_refreshes + 1,
                }
            }
            Err(e) => {
                warn!(prediction_id = %job.id, "Status refresh failed, giving up: {e}");
                PollState::Finished(conclude(job, Some(e)))
            }
        }
    }
}

/// Turns the last observed job snapshot into an outcome.
fn conclude(job: PredictionJob, poll_error: Option<ProviderError>) -> PollOutcome {
    let error = match job.status {
        PredictionStatus::Succeeded => match job.output.as_ref().and_then(extract_video_url) {
            Some(video_url) => {
                info!(prediction_id = %job.id, "Prediction succeeded");
                return PollOutcome::Succeeded {
                    prediction_id: job.id,
                    video_url,
                };
            }
            None => VideoGenError::PayloadShape(describe_output(job.output.as_ref())),
        },
        status if status.is_pending() => {
            let detail = poll_error
                .map(|e| e.detail().to_string())
                .unwrap_or_else(|| format!("prediction was still {status}"));
            VideoGenError::ProviderPoll(detail)
        }
        PredictionStatus::Failed | PredictionStatus::Canceled => VideoGenError::ProviderFailed(
            job.error_detail()
                .unwrap_or_else(|| format!("prediction {}", job.status)),
        ),
        _ => VideoGenError::Unknown(
            job.error_detail()
                .unwrap_or_else(|| "provider reported an unrecognised status".to_string()),
        ),
    };

    PollOutcome::Failed {
        prediction_id: Some(job.id),
        error,
    }
}

/// Output may be a single URL or a list. The first string that parses as an
/// http(s) URL wins, wherever it sits in the list.
pub fn extract_video_url(output: &Value) -> Option<Url> {
    match output {
        Value::String(s) => parse_video_url(s),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .find_map(parse_video_url),
        _ => None,
    }
}

fn parse_video_url(candidate: &str) -> Option<Url> {
    Url::parse(candidate.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

fn describe_output(output: Option<&Value>) -> String {
    let kind = match output {
        None | Some(Value::Null) => "no output",
        Some(Value::Bool(_)) => "a boolean",
        Some(Value::Number(_)) => "a number",
        Some(Value::String(_)) => "a string that is not a URL",
        Some(Value::Array(_)) => "a list without any URL",
        Some(Value::Object(_)) => "an object",
    };
    format!("expected a video URL, got {kind}")
}
