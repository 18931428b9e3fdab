use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// A single rejected field, named as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Everything that can go wrong between receiving a generation request and
/// handing a result back. None of these escape the handler as a transport
/// fault; they are rendered into a `failed` result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VideoGenError {
    #[error("Invalid request: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Video generation could not be started: {0}")]
    ProviderSubmission(String),

    #[error("Lost contact with the video provider while waiting for the result: {0}")]
    ProviderPoll(String),

    #[error("Video generation failed: {0}")]
    ProviderFailed(String),

    #[error("Video generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Generation finished but returned an unexpected payload: {0}")]
    PayloadShape(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl VideoGenError {
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            VideoGenError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure talking to the prediction provider over HTTP.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// The most useful human-readable part of the error.
    pub fn detail(&self) -> &str {
        match self {
            ProviderError::Network(detail)
            | ProviderError::Api { detail, .. }
            | ProviderError::Decode(detail) => detail,
        }
    }
}
