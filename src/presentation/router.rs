use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    artifact_download_handler, delete_job_handler, health_handler, job_diagnostics_handler,
    job_status_handler, stream_transcribe_handler, supported_languages_handler, transcribe_handler,
};
use crate::presentation::state::AppState;

/// Multipart framing overhead allowed on top of the upload limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let upload_limit = state.settings.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/transcribe",
            post(transcribe_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/stream-transcribe", get(stream_transcribe_handler))
        .route(
            "/jobs/{job_id}",
            get(job_status_handler).delete(delete_job_handler),
        )
        .route("/jobs/{job_id}/diagnostics", get(job_diagnostics_handler))
        .route("/artifacts/{artifact_id}", get(artifact_download_handler))
        .route("/supported-languages", get(supported_languages_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
