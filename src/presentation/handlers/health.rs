use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::StorageUsage;
use crate::application::services::{EngineHealth, StageMetrics};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub engines: BTreeMap<&'static str, EngineHealth>,
    pub stages: BTreeMap<&'static str, StageMetrics>,
    pub storage: StorageUsage,
    pub jobs: usize,
}

pub async fn health_handler(State(state): State<AppState>) -> Response {
    let report = state.orchestrator.health().await;

    let (status_code, status) = if report.healthy {
        (StatusCode::OK, "healthy")
    } else {
        for engine in report.engines.iter().filter(|e| !e.healthy) {
            tracing::warn!(stage = engine.stage, engine = %engine.engine, detail = ?engine.detail, "Engine unhealthy");
        }
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let response = HealthResponse {
        status,
        engines: report.engines.into_iter().map(|e| (e.stage, e)).collect(),
        stages: report.stages.into_iter().map(|m| (m.stage, m)).collect(),
        storage: report.storage,
        jobs: report.jobs,
    };
    (status_code, Json(response)).into_response()
}
