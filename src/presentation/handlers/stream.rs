use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::application::services::{StageError, StreamRequest, StreamSession};
use crate::domain::{PcmBuffer, STREAM_SAMPLE_RATE, StreamChunk};
use crate::infrastructure::audio::encode_pcm16_wav;
use crate::presentation::state::AppState;

use super::error_response::error_response;
use super::transcribe::optional_language;

/// Text frame that flushes the buffered audio and ends the stream.
pub const END_OF_STREAM: &str = "end";

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub language: Option<String>,
    pub target_lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StreamMessage {
    pub chunk_id: u64,
    pub transcription: String,
    pub translation: String,
    pub is_final: bool,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamMessage {
    fn from_chunk(chunk: StreamChunk, is_final: bool) -> Self {
        Self {
            chunk_id: chunk.chunk_id,
            transcription: chunk.transcription,
            translation: chunk.translation,
            is_final,
            confidence: chunk.confidence,
            error: None,
        }
    }

    fn empty(chunk_id: u64, error: Option<String>) -> Self {
        Self {
            chunk_id,
            transcription: String::new(),
            translation: String::new(),
            is_final: true,
            confidence: 0.0,
            error,
        }
    }
}

enum StreamEnd {
    Finished,
    Disconnected,
}

/// Binary frames carry 16 kHz mono 16 bit little-endian PCM.
pub async fn stream_transcribe_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> Response {
    let source_language = match optional_language(params.language.as_deref().unwrap_or(""), "language") {
        Ok(l) => l,
        Err(response) => return response,
    };
    if let Some(language) = &source_language {
        if !state.transcription_languages.is_empty() && !state.transcription_languages.contains(language) {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Unsupported transcription language: {}", language),
            );
        }
    }
    let target_language =
        match optional_language(params.target_lang.as_deref().unwrap_or(""), "target_lang") {
            Ok(l) => l,
            Err(response) => return response,
        };

    let request = StreamRequest {
        source_language,
        target_language,
    };
    let buffer = PcmBuffer::for_duration(state.settings.stream_chunk_secs());
    ws.on_upgrade(move |socket| run_stream(socket, state, request, buffer))
        .into_response()
}

async fn run_stream(mut socket: WebSocket, state: AppState, request: StreamRequest, mut buffer: PcmBuffer) {
    let mut session = state.stream.open(request);

    let close = match receive_audio(&mut socket, &state, &mut session, &mut buffer).await {
        Ok(StreamEnd::Finished) => Some(CloseFrame {
            code: close_code::NORMAL,
            reason: Utf8Bytes::from_static("end of stream"),
        }),
        Ok(StreamEnd::Disconnected) => None,
        Err(e) => {
            tracing::warn!(session_id = %session.id(), error = %e, "Stream chunk failed");
            let failure = e.to_failure(None);
            let message = StreamMessage::empty(session.chunks(), Some(failure.message));
            send_json(&mut socket, &message).await;
            Some(CloseFrame {
                code: close_code::ERROR,
                reason: Utf8Bytes::from_static(failure.code.as_str()),
            })
        }
    };

    if let Some(frame) = close {
        if socket.send(Message::Close(Some(frame))).await.is_err() {
            tracing::debug!(session_id = %session.id(), "Client gone before close frame");
        }
    }
    state.stream.close(session).await;
}

async fn receive_audio(
    socket: &mut WebSocket,
    state: &AppState,
    session: &mut StreamSession,
    buffer: &mut PcmBuffer,
) -> Result<StreamEnd, StageError> {
    while let Some(frame) = socket.recv().await {
        let message = match frame {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(session_id = %session.id(), error = %e, "Stream receive failed");
                return Ok(StreamEnd::Disconnected);
            }
        };

        match message {
            Message::Binary(data) => {
                for pcm in buffer.push(&data) {
                    if let Some(chunk) = transcribe_pcm(state, session, pcm).await? {
                        if !send_json(socket, &StreamMessage::from_chunk(chunk, false)).await {
                            return Ok(StreamEnd::Disconnected);
                        }
                    }
                }
            }
            Message::Text(text) if text.as_str().trim().eq_ignore_ascii_case(END_OF_STREAM) => {
                let last = match buffer.flush() {
                    Some(pcm) => transcribe_pcm(state, session, pcm).await?,
                    None => None,
                };
                let message = match last {
                    Some(chunk) => StreamMessage::from_chunk(chunk, true),
                    None => StreamMessage::empty(session.chunks(), None),
                };
                if !send_json(socket, &message).await {
                    return Ok(StreamEnd::Disconnected);
                }
                return Ok(StreamEnd::Finished);
            }
            Message::Text(text) => {
                tracing::debug!(session_id = %session.id(), text = %text.as_str(), "Ignoring text frame");
            }
            Message::Close(_) => return Ok(StreamEnd::Disconnected),
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
    Ok(StreamEnd::Disconnected)
}

async fn transcribe_pcm(
    state: &AppState,
    session: &mut StreamSession,
    pcm: Vec<u8>,
) -> Result<Option<StreamChunk>, StageError> {
    let wav = encode_pcm16_wav(&pcm, STREAM_SAMPLE_RATE)
        .map_err(|e| StageError::Internal(format!("wav encoding failed: {}", e)))?;
    state.stream.process_chunk(session, Bytes::from(wav)).await
}

async fn send_json(socket: &mut WebSocket, message: &StreamMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode stream message");
            return false;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}
