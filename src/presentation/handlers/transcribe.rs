use axum::Json;
use axum::extract::{Multipart, State};
use axum::extract::multipart::Field;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;

use crate::application::services::SubmitRequest;
use crate::domain::{JobRequest, JobState, LanguageCode, TranscriptionTask};
use crate::presentation::state::AppState;

use super::error_response::error_response;

pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["wav", "mp3", "m4a", "flac", "ogg", "aac", "wma"];

const MAX_FILENAME_CHARS: usize = 128;

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub job_id: String,
    pub state: String,
    pub status_url: String,
}

struct Upload {
    filename: String,
    extension: &'static str,
    data: Bytes,
}

#[derive(Default)]
struct Form {
    upload: Option<Upload>,
    language: Option<LanguageCode>,
    task: TranscriptionTask,
    target_language: Option<LanguageCode>,
    synthesize: bool,
    voice: Option<String>,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(f) => f,
        Err(response) => return response,
    };

    let Some(upload) = form.upload else {
        tracing::warn!("Transcribe request without file");
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    if let Some(language) = &form.language {
        if !state.transcription_languages.is_empty() && !state.transcription_languages.contains(language) {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Unsupported transcription language: {}", language),
            );
        }
    }

    let size = upload.data.len();
    let request = JobRequest {
        filename: upload.filename.clone(),
        source_language: form.language,
        task: form.task,
        target_language: form.target_language,
        synthesize: form.synthesize,
        voice: form.voice,
    };
    let submission = SubmitRequest {
        request,
        data: upload.data,
        content_type: content_type_for(upload.extension).to_string(),
    };

    let job_id = match state.orchestrator.submit(submission).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to submit job");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create job");
        }
    };

    let job_state = match state.orchestrator.status(job_id).await {
        Ok(Some(snapshot)) => snapshot.job.state,
        _ => JobState::Queued,
    };

    tracing::info!(job_id = %job_id, filename = %upload.filename, bytes = size, "Upload accepted");

    (
        StatusCode::ACCEPTED,
        Json(TranscribeResponse {
            job_id: job_id.to_string(),
            state: job_state.as_str().to_string(),
            status_url: format!("/jobs/{}", job_id),
        }),
    )
        .into_response()
}

async fn read_form(mut multipart: Multipart) -> Result<Form, Response> {
    let mut form = Form::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return Err(error_response(e.status(), format!("Failed to read multipart: {}", e)));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => form.upload = Some(read_upload(field).await?),
            "language" => form.language = optional_language(&text(field).await?, "language")?,
            "target_lang" => {
                form.target_language = optional_language(&text(field).await?, "target_lang")?
            }
            "task" => {
                let raw = text(field).await?;
                form.task = match raw.trim() {
                    "" => TranscriptionTask::Transcribe,
                    other => TranscriptionTask::parse(other).ok_or_else(|| {
                        error_response(StatusCode::BAD_REQUEST, format!("Invalid task: {}", other))
                    })?,
                };
            }
            "synthesize" => form.synthesize = parse_flag(&text(field).await?)?,
            "voice" => {
                let raw = text(field).await?;
                let raw = raw.trim();
                form.voice = (!raw.is_empty()).then(|| raw.to_string());
            }
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

async fn read_upload(field: Field<'_>) -> Result<Upload, Response> {
    let filename = sanitize_filename(field.file_name().unwrap_or_default());
    let content_type = field.content_type().map(str::to_string);

    let extension = extension_of(&filename).ok_or_else(|| {
        tracing::warn!(filename = %filename, "Unsupported file extension");
        error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!(
                "Unsupported file type. Allowed extensions: {}",
                SUPPORTED_EXTENSIONS.join(", ")
            ),
        )
    })?;

    if let Some(content_type) = &content_type {
        if !is_audio_content_type(content_type) {
            tracing::warn!(content_type = %content_type, "Unsupported content type");
            return Err(error_response(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Unsupported content type: {}", content_type),
            ));
        }
    }

    let data = field.bytes().await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to read upload");
        let status = e.status();
        let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "Uploaded file is too large".to_string()
        } else {
            format!("Failed to read file: {}", e)
        };
        error_response(status, message)
    })?;

    if data.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Uploaded file is empty"));
    }

    Ok(Upload {
        filename,
        extension,
        data,
    })
}

async fn text(field: Field<'_>) -> Result<String, Response> {
    let name = field.name().unwrap_or_default().to_string();
    field.text().await.map_err(|e| {
        error_response(e.status(), format!("Failed to read field {}: {}", name, e))
    })
}

/// Empty or `auto` means "detect".
pub(super) fn optional_language(raw: &str, field: &str) -> Result<Option<LanguageCode>, Response> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    LanguageCode::parse(raw)
        .map(Some)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("Invalid {}: {}", field, e)))
}

fn parse_flag(raw: &str) -> Result<bool, Response> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" => Ok(false),
        "true" | "1" | "yes" => Ok(true),
        other => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid synthesize flag: {}", other),
        )),
    }
}

/// Strips directories and anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(MAX_FILENAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn extension_of(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.iter().copied().find(|e| *e == ext)
}

fn is_audio_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("audio/") || essence == "application/octet-stream" || essence == "video/mp4"
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "aac" => "audio/aac",
        "wma" => "audio/x-ms-wma",
        _ => "application/octet-stream",
    }
}
