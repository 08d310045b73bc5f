use async_trait::async_trait;

use crate::domain::{EngineTranscript, TranscriptionOptions};

#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn transcribe(
        &self,
        audio_data: &[u8],
        file_name: &str,
        options: &TranscriptionOptions,
    ) -> Result<EngineTranscript, TranscriptionError>;

    /// Cheap liveness probe against the loaded model or remote endpoint.
    async fn health_check(&self) -> Result<(), TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
}
