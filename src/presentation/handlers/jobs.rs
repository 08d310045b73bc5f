use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::{CancelOutcome, OrchestratorError};
use crate::domain::{Artifact, Job, JobFailure, JobId, TranscriptSegment};
use crate::infrastructure::observability::preview_text;
use crate::presentation::state::AppState;

use super::error_response::{error_response, parse_uuid};

#[derive(Serialize)]
pub struct ArtifactView {
    pub id: String,
    pub kind: &'static str,
    pub content_type: String,
    pub size_bytes: u64,
    pub url: String,
}

impl From<&Artifact> for ArtifactView {
    fn from(artifact: &Artifact) -> Self {
        Self {
            id: artifact.id.to_string(),
            kind: artifact.kind.as_str(),
            content_type: artifact.content_type.clone(),
            size_bytes: artifact.size_bytes,
            url: format!("/artifacts/{}", artifact.id),
        }
    }
}

#[derive(Serialize)]
pub struct RequestView {
    pub filename: String,
    pub language: Option<String>,
    pub task: &'static str,
    pub target_lang: Option<String>,
    pub synthesize: bool,
    pub voice: Option<String>,
}

#[derive(Serialize)]
pub struct FailureView {
    pub code: &'static str,
    pub category: &'static str,
    pub stage: Option<&'static str>,
    pub message: String,
}

impl From<&JobFailure> for FailureView {
    fn from(failure: &JobFailure) -> Self {
        Self {
            code: failure.code.as_str(),
            category: failure.category.as_str(),
            stage: failure.stage.map(|s| s.as_str()),
            message: failure.message.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ResultView {
    pub detected_language: Option<String>,
    pub segments: Vec<TranscriptSegment>,
    pub artifacts: Vec<ArtifactView>,
}

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub id: String,
    pub state: &'static str,
    pub request: RequestView,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureView>,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub job_id: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
}

#[derive(Serialize)]
pub struct DiagnosticsResponse {
    pub job_id: String,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureView>,
    pub partial_artifacts: Vec<ArtifactView>,
}

fn request_view(job: &Job) -> RequestView {
    let request = &job.request;
    RequestView {
        filename: request.filename.clone(),
        language: request.source_language.as_ref().map(|l| l.to_string()),
        task: request.task.as_str(),
        target_lang: request.target_language.as_ref().map(|l| l.to_string()),
        synthesize: request.synthesize,
        voice: request.voice.clone(),
    }
}

fn job_not_found(job_id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Job not found: {}", job_id))
}

fn internal_error(e: OrchestratorError) -> Response {
    tracing::error!(error = %e, "Job request failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let id = match parse_uuid(&job_id, "job") {
        Ok(u) => JobId::from_uuid(u),
        Err(response) => return response,
    };

    let snapshot = match state.orchestrator.status(id).await {
        Ok(Some(s)) => s,
        Ok(None) => return job_not_found(&job_id),
        Err(e) => return internal_error(e),
    };
    let job = &snapshot.job;

    if let Some(result) = &job.result {
        let text: Vec<&str> = result.segments.iter().map(|s| s.text.as_str()).collect();
        tracing::debug!(transcript = %preview_text(&text.join(" ")), "Serving completed job");
    }

    let result = job.result.as_ref().map(|r| ResultView {
        detected_language: r.detected_language.as_ref().map(|l| l.to_string()),
        segments: r.segments.clone(),
        artifacts: snapshot.artifacts.iter().map(ArtifactView::from).collect(),
    });

    let response = JobStatusResponse {
        id: job.id.to_string(),
        state: job.state.as_str(),
        request: request_view(job),
        created_at: job.created_at.to_rfc3339(),
        updated_at: job.updated_at.to_rfc3339(),
        result,
        failure: job.failure.as_ref().map(FailureView::from),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Cancels a running job, or finalizes one that already reached a terminal state.
#[tracing::instrument(skip(state))]
pub async fn delete_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let id = match parse_uuid(&job_id, "job") {
        Ok(u) => JobId::from_uuid(u),
        Err(response) => return response,
    };

    let outcome = match state.orchestrator.cancel(id).await {
        Ok(o) => o,
        Err(OrchestratorError::JobNotFound(_)) => return job_not_found(&job_id),
        Err(e) => return internal_error(e),
    };

    let (label, stage) = match outcome {
        CancelOutcome::Cancelled => ("cancelled", None),
        CancelOutcome::CancelRequested(stage) => ("cancel_requested", Some(stage.as_str())),
        CancelOutcome::AlreadyTerminal(_) => {
            return match state.orchestrator.finalize(id).await {
                Ok(_) => StatusCode::NO_CONTENT.into_response(),
                Err(OrchestratorError::JobNotFound(_)) => job_not_found(&job_id),
                Err(e) => internal_error(e),
            };
        }
    };

    (
        StatusCode::ACCEPTED,
        Json(CancelResponse {
            job_id: id.to_string(),
            outcome: label,
            stage,
        }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn job_diagnostics_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let id = match parse_uuid(&job_id, "job") {
        Ok(u) => JobId::from_uuid(u),
        Err(response) => return response,
    };

    let snapshot = match state.orchestrator.status(id).await {
        Ok(Some(s)) => s,
        Ok(None) => return job_not_found(&job_id),
        Err(e) => return internal_error(e),
    };
    let artifacts = match state.orchestrator.diagnostics(id).await {
        Ok(a) => a,
        Err(OrchestratorError::JobNotFound(_)) => return job_not_found(&job_id),
        Err(e) => return internal_error(e),
    };

    (
        StatusCode::OK,
        Json(DiagnosticsResponse {
            job_id: id.to_string(),
            state: snapshot.job.state.as_str(),
            failure: snapshot.job.failure.as_ref().map(FailureView::from),
            partial_artifacts: artifacts.iter().map(ArtifactView::from).collect(),
        }),
    )
        .into_response()
}
