use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct VoiceView {
    pub id: String,
    pub language: String,
}

#[derive(Serialize)]
pub struct SupportedLanguagesResponse {
    pub transcription: Vec<String>,
    pub translation_pairs: Vec<String>,
    pub voices: Vec<VoiceView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_error: Option<String>,
}

pub async fn supported_languages_handler(State(state): State<AppState>) -> Response {
    let (translation_pairs, translation_error) =
        match state.orchestrator.translation().supported_pairs().await {
            Ok(pairs) => (pairs.iter().map(|p| p.to_string()).collect(), None),
            Err(e) => {
                tracing::warn!(error = %e, "Translation pairs unavailable");
                (Vec::new(), Some(e.to_string()))
            }
        };

    let voices = state
        .orchestrator
        .synthesis()
        .voices()
        .voices()
        .iter()
        .map(|v| VoiceView {
            id: v.id.clone(),
            language: v.language.to_string(),
        })
        .collect();

    (
        StatusCode::OK,
        Json(SupportedLanguagesResponse {
            transcription: state
                .transcription_languages
                .iter()
                .map(|l| l.to_string())
                .collect(),
            translation_pairs,
            voices,
            translation_error,
        }),
    )
        .into_response()
}
