use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

use crate::consts::{FRAMES_PER_SECOND, MAX_FRAMES};
use crate::error::FieldError;

/// Visual style label offered by the form
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    ToSchema,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    Cinematic,
    Photorealistic,
    Anime,
    #[strum(serialize = "3d-render")]
    #[serde(rename = "3d-render")]
    Render3d,
    Watercolor,
    Cyberpunk,
}

impl Style {
    pub fn labels() -> Vec<String> {
        Self::iter().map(|s| s.to_string()).collect()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    ToSchema,
)]
pub enum AspectRatio {
    #[strum(serialize = "16:9")]
    #[serde(rename = "16:9")]
    Landscape,
    #[strum(serialize = "9:16")]
    #[serde(rename = "9:16")]
    Portrait,
    #[strum(serialize = "1:1")]
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn labels() -> Vec<String> {
        Self::iter().map(|r| r.to_string()).collect()
    }
}

/// Body of `POST /generate` as sent by the browser. Every field is optional
/// here so that missing fields are reported per field instead of as a
/// generic decode failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    #[schema(example = "16:9")]
    pub aspect_ratio: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<f64>,
}

/// A request that passed validation. Fields are private so it cannot be
/// changed after the validator built it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    style: Style,
    aspect_ratio: AspectRatio,
    duration_secs: f64,
}

impl GenerationRequest {
    pub(super) fn new(
        prompt: String,
        style: Style,
        aspect_ratio: AspectRatio,
        duration_secs: f64,
    ) -> Self {
        Self {
            prompt,
            style,
            aspect_ratio,
            duration_secs,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Prompt text sent to the model, annotated with style and framing.
    pub fn composed_prompt(&self) -> String {
        format!(
            "{}. Style: {}. Aspect ratio: {}",
            self.prompt, self.style, self.aspect_ratio
        )
    }

    pub fn frame_count(&self) -> u32 {
        frame_count(self.duration_secs)
    }
}

/// `min(floor(duration * 8), 160)`
pub fn frame_count(duration_secs: f64) -> u32 {
    let frames = (duration_secs * FRAMES_PER_SECOND).floor();
    if frames <= 0.0 {
        return 0;
    }
    (frames as u32).min(MAX_FRAMES)
}

/// Prediction status as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    /// The job is still queued or running on the provider side.
    pub fn is_pending(self) -> bool {
        matches!(self, PredictionStatus::Starting | PredictionStatus::Processing)
    }
}

/// Snapshot of a remote prediction. The job itself lives on the provider;
/// this is only the last thing we were told about it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionJob {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl PredictionJob {
    /// Provider supplied failure reason, if any.
    pub fn error_detail(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Input sent to the provider when creating a prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionInput {
    pub prompt: String,
    pub num_frames: u32,
}

impl From<&GenerationRequest> for PredictionInput {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            prompt: request.composed_prompt(),
            num_frames: request.frame_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Mock,
    Succeeded,
    Failed,
}

/// What the browser gets back. Always delivered with HTTP 200; `status`
/// carries success or failure.
///
/// Only the constructors below build one, which keeps `succeeded` and `mock`
/// results tied to a video URL and `failed` results free of one.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prediction_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    field_errors: Vec<FieldError>,
}

impl GenerationResult {
    pub fn mock(video_url: &Url, message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Mock,
            video_url: Some(video_url.to_string()),
            message: Some(message.into()),
            prediction_id: None,
            field_errors: Vec::new(),
        }
    }

    pub fn succeeded(prediction_id: String, video_url: &Url, message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Succeeded,
            video_url: Some(video_url.to_string()),
            message: Some(message.into()),
            prediction_id: Some(prediction_id),
            field_errors: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>, prediction_id: Option<String>) -> Self {
        Self {
            status: ResultStatus::Failed,
            video_url: None,
            message: Some(message.into()),
            prediction_id,
            field_errors: Vec::new(),
        }
    }

    pub fn with_field_errors(mut self, field_errors: Vec<FieldError>) -> Self {
        self.field_errors = field_errors;
        self
    }

    pub fn status(&self) -> ResultStatus {
        self.status
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn prediction_id(&self) -> Option<&str> {
        self.prediction_id.as_deref()
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnalyzePromptRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptAnalysis {
    pub word_count: usize,
    pub keywords: Vec<KeywordCount>,
}

/// Form options, so the page renders its controls from the server's rules
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub styles: Vec<String>,
    pub aspect_ratios: Vec<String>,
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
    pub min_prompt_chars: usize,
    pub mock_mode: bool,
}
