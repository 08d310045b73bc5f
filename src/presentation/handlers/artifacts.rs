use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::services::OrchestratorError;
use crate::domain::ArtifactId;
use crate::presentation::state::AppState;

use super::error_response::{error_response, parse_uuid};

#[tracing::instrument(skip(state))]
pub async fn artifact_download_handler(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> Response {
    let id = match parse_uuid(&artifact_id, "artifact") {
        Ok(u) => ArtifactId::from_uuid(u),
        Err(response) => return response,
    };

    match state.orchestrator.artifact_for_download(id).await {
        Ok((artifact, bytes)) => {
            let disposition = format!(
                "attachment; filename=\"{}-{}\"",
                artifact.kind.as_str(),
                artifact.path.file_name()
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, artifact.content_type.clone()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(OrchestratorError::ArtifactNotFound(_)) => error_response(
            StatusCode::NOT_FOUND,
            format!("Artifact not found: {}", artifact_id),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serve artifact");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}
