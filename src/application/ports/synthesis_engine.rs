use async_trait::async_trait;

use crate::domain::{SynthesisOptions, Voice};

#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Returns WAV encoded audio.
    async fn synthesize(
        &self,
        text: &str,
        voice: &Voice,
        options: &SynthesisOptions,
    ) -> Result<Vec<u8>, SynthesisError>;

    async fn health_check(&self) -> Result<(), SynthesisError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("unknown voice: {0}")]
    UnknownVoice(String),
    #[error("input rejected: {0}")]
    InputRejected(String),
    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
}
