use std::time::Duration;

use crate::application::ports::ArtifactStoreError;
use crate::domain::{FailureCode, JobFailure, Stage};

/// Failure taxonomy every adapter reports in. Engine specific errors never
/// cross an adapter boundary.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("{stage} engine timed out after {timeout:?}")]
    EngineTimeout { stage: Stage, timeout: Duration },
    #[error("{stage} engine failed: {message}")]
    EngineFailure { stage: Stage, message: String },
    #[error("no speech detected in audio")]
    NoSpeechDetected,
    #[error("unsupported language pair {source_language} -> {target_language}")]
    UnsupportedLanguagePair {
        source_language: String,
        target_language: String,
    },
    #[error("unsupported voice: {0}")]
    UnsupportedVoice(String),
    #[error("text too long: {length} characters exceeds limit of {limit}")]
    TextTooLong { length: usize, limit: usize },
    #[error("storage full: {0}")]
    StorageFull(String),
    #[error("no {stage} slot became free within {waited:?}")]
    QueueTimeout { stage: Stage, waited: Duration },
    #[error("internal error: {0}")]
    Internal(String),
}

impl StageError {
    pub fn code(&self) -> FailureCode {
        match self {
            Self::UnsupportedFormat(_) => FailureCode::UnsupportedFormat,
            Self::EngineTimeout { .. } => FailureCode::EngineTimeout,
            Self::EngineFailure { .. } => FailureCode::EngineFailure,
            Self::NoSpeechDetected => FailureCode::NoSpeechDetected,
            Self::UnsupportedLanguagePair { .. } => FailureCode::UnsupportedLanguagePair,
            Self::UnsupportedVoice(_) => FailureCode::UnsupportedVoice,
            Self::TextTooLong { .. } => FailureCode::TextTooLong,
            Self::StorageFull(_) => FailureCode::StorageFull,
            Self::QueueTimeout { .. } => FailureCode::QueueTimeout,
            Self::Internal(_) => FailureCode::Internal,
        }
    }

    pub fn engine(stage: Stage, message: impl Into<String>) -> Self {
        Self::EngineFailure {
            stage,
            message: message.into(),
        }
    }

    pub fn to_failure(&self, stage: Option<Stage>) -> JobFailure {
        JobFailure::new(self.code(), stage, self.to_string())
    }
}

impl From<ArtifactStoreError> for StageError {
    fn from(e: ArtifactStoreError) -> Self {
        match e {
            ArtifactStoreError::StorageFull { .. } => Self::StorageFull(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
