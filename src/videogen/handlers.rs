use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::app_state::AppState;
use crate::consts::{DURATION_RANGE_SECS, MIN_PROMPT_CHARS};
use crate::error::{FieldError, VideoGenError};

use super::normalizer::{failure, normalize};
use super::poll::PollLoop;
use super::prompt_analysis;
use super::types::{
    AnalyzePromptRequest, AspectRatio, GenerateVideoRequest, GenerationOptions, GenerationResult,
    PromptAnalysis, Style,
};
use super::validation::validate_request;

/// Generate a video from a text prompt.
///
/// Blocks until the provider finishes, fails, or the time budget runs out.
/// Always answers 200; the outcome is in the body's `status` field.
#[utoipa::path(
    post,
    path = "/generate",
    request_body = GenerateVideoRequest,
    responses(
        (status = 200, description = "Generation finished (mock, succeeded or failed)", body = GenerationResult),
    ),
    tag = "VideoGen"
)]
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn generate_video(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateVideoRequest>, JsonRejection>,
) -> Json<GenerationResult> {
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            warn!("Rejected generation request body: {rejection}");
            let error = VideoGenError::Validation(vec![FieldError::new(
                "body",
                rejection.body_text(),
            )]);
            return Json(failure(error, None));
        }
    };

    let request = match validate_request(&raw) {
        Ok(request) => request,
        Err(e) => {
            info!("Generation request failed validation: {e}");
            return Json(failure(e, None));
        }
    };

    info!(
        style = %request.style(),
        aspect_ratio = %request.aspect_ratio(),
        duration_secs = request.duration_secs(),
        mock_mode = state.is_mock_mode(),
        "Starting video generation"
    );

    // Run on its own task so a panic inside the provider path still becomes
    // an in-band failure.
    let task_state = state.clone();
    let outcome = tokio::spawn(async move {
        PollLoop::new(
            task_state.provider.as_deref(),
            task_state.clock.as_ref(),
            task_state.poll_settings,
        )
        .run(&request)
        .await
    })
    .await;

    let result = match outcome {
        Ok(outcome) => normalize(outcome, &state.mock_video_url),
        Err(e) => {
            error!("Video generation task aborted: {e}");
            failure(VideoGenError::Unknown(e.to_string()), None)
        }
    };

    info!(status = ?result.status(), "Video generation finished");
    Json(result)
}

/// Keyword summary of a prompt, shown by the page while it waits. A body
/// that cannot be read yields an empty summary rather than an error status.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzePromptRequest,
    responses(
        (status = 200, description = "Top keywords in the prompt", body = PromptAnalysis),
    ),
    tag = "VideoGen"
)]
pub async fn analyze_prompt(
    payload: Result<Json<AnalyzePromptRequest>, JsonRejection>,
) -> Json<PromptAnalysis> {
    match payload {
        Ok(Json(request)) => Json(prompt_analysis::analyze_prompt(&request.prompt)),
        Err(rejection) => {
            warn!("Rejected prompt analysis body: {rejection}");
            Json(PromptAnalysis::default())
        }
    }
}

/// Allowed values for the generation form
#[utoipa::path(
    get,
    path = "/options",
    responses(
        (status = 200, description = "Form options", body = GenerationOptions),
    ),
    tag = "VideoGen"
)]
pub async fn get_options(State(state): State<Arc<AppState>>) -> Json<GenerationOptions> {
    Json(GenerationOptions {
        styles: Style::labels(),
        aspect_ratios: AspectRatio::labels(),
        min_duration_secs: *DURATION_RANGE_SECS.start(),
        max_duration_secs: *DURATION_RANGE_SECS.end(),
        min_prompt_chars: MIN_PROMPT_CHARS,
        mock_mode: state.is_mock_mode(),
    })
}
