use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{app_state::AppState, consts::MAX_REQUEST_BODY_BYTES, videogen::handlers};

/// V1 API routes for video generation
pub fn videogen_router<S>(state: Arc<AppState>) -> OpenApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    OpenApiRouter::new()
        .routes(routes!(handlers::generate_video))
        .routes(routes!(handlers::analyze_prompt))
        .routes(routes!(handlers::get_options))
        // Oversized bodies surface as a JsonRejection, answered in-band
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}
