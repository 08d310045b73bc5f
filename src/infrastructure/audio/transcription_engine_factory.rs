use std::sync::Arc;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::presentation::config::TranscriptionProvider;

use super::mock_transcription_engine::MockTranscriptionEngine;
use super::openai_whisper_engine::OpenAiWhisperEngine;

pub struct TranscriptionEngineFactory;

impl TranscriptionEngineFactory {
    pub fn create(
        provider: TranscriptionProvider,
        model: &str,
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
        match provider {
            TranscriptionProvider::Local => create_local(model),
            TranscriptionProvider::OpenAi => {
                tracing::info!(model = %model, base_url = ?base_url, "Using Whisper API transcription");
                Ok(Arc::new(OpenAiWhisperEngine::new(
                    api_key,
                    base_url,
                    Some(model.to_string()),
                )))
            }
            TranscriptionProvider::Mock => {
                tracing::info!("Using mock transcription engine");
                Ok(Arc::new(MockTranscriptionEngine::new()))
            }
        }
    }
}

#[cfg(feature = "local-whisper")]
fn create_local(model: &str) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
    let engine = super::candle_whisper_engine::CandleWhisperEngine::new(model)?;
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "local-whisper"))]
fn create_local(model: &str) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
    Err(TranscriptionError::ModelLoadFailed(format!(
        "local model {} requested but the local-whisper feature is disabled",
        model
    )))
}
