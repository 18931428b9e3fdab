use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::response::Html;
use axum::{routing::get, Router};
use sentry_tower::{NewSentryLayer, SentryHttpLayer};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::instrument;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

mod app_state;
mod config;
mod consts;
mod error;
mod middleware;
pub mod videogen;

use app_state::AppState;
use crate::config::AppConfig;

const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "VideoGen", description = "Text-to-video generation API"),
    )
)]
struct ApiDoc;

fn app(shared_state: Arc<AppState>) -> Router {
    let router = OpenApiRouter::with_openapi(ApiDoc::openapi()).nest(
        "/api/v1/videogen",
        videogen::videogen_router(shared_state.clone()),
    );

    let (router, api) = router.split_for_parts();

    let router =
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()));

    let sentry_tower_layer = ServiceBuilder::new()
        .layer(NewSentryLayer::new_from_top())
        .layer(SentryHttpLayer::with_transaction());

    Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(health_handler))
        .merge(router)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(
            crate::middleware::http_logging_middleware,
        )) // HTTP logging before Sentry
        .layer(sentry_tower_layer)
}

async fn main_impl(conf: AppConfig) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], conf.port));
    let shared_state = Arc::new(AppState::new(conf)?);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    log::info!("listening on {addr}");

    axum::serve(listener, app(shared_state)).await?;

    Ok(())
}

fn main() -> Result<()> {
    let conf = AppConfig::load().context("Failed to load configuration")?;

    let _guard = conf.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                traces_sample_rate: conf.sentry_traces_sample_rate,
                send_default_pii: false,
                attach_stacktrace: true,
                before_send: Some(crate::middleware::sentry_scrub::create_before_send()),
                ..Default::default()
            },
        ))
    });

    // Only errors become Sentry events, warnings ride along as breadcrumbs
    let sentry_layer = sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=info,tower_http=warn,axum::rejection=warn,hyper=warn,reqwest=warn",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(main_impl(conf))
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[instrument]
async fn health_handler() -> &'static str {
    "OK"
}
