use std::fmt;

use super::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    InputError,
    EngineError,
    ResourceError,
    InternalError,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputError => "InputError",
            Self::EngineError => "EngineError",
            Self::ResourceError => "ResourceError",
            Self::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCode {
    UnsupportedFormat,
    EngineTimeout,
    EngineFailure,
    NoSpeechDetected,
    UnsupportedLanguagePair,
    UnsupportedVoice,
    TextTooLong,
    StorageFull,
    QueueTimeout,
    Internal,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "UnsupportedFormat",
            Self::EngineTimeout => "EngineTimeout",
            Self::EngineFailure => "EngineFailure",
            Self::NoSpeechDetected => "NoSpeechDetected",
            Self::UnsupportedLanguagePair => "UnsupportedLanguagePair",
            Self::UnsupportedVoice => "UnsupportedVoice",
            Self::TextTooLong => "TextTooLong",
            Self::StorageFull => "StorageFull",
            Self::QueueTimeout => "QueueTimeout",
            Self::Internal => "Internal",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedFormat => ErrorCategory::InputError,
            Self::EngineTimeout
            | Self::EngineFailure
            | Self::NoSpeechDetected
            | Self::UnsupportedLanguagePair
            | Self::UnsupportedVoice
            | Self::TextTooLong => ErrorCategory::EngineError,
            Self::StorageFull | Self::QueueTimeout => ErrorCategory::ResourceError,
            Self::Internal => ErrorCategory::InternalError,
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job ended in `failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub code: FailureCode,
    pub category: ErrorCategory,
    pub stage: Option<Stage>,
    pub message: String,
}

impl JobFailure {
    pub fn new(code: FailureCode, stage: Option<Stage>, message: impl Into<String>) -> Self {
        let category = code.category();
        // Internal details stay in the logs.
        let message = if category == ErrorCategory::InternalError {
            "internal error".to_string()
        } else {
            message.into()
        };
        Self {
            code,
            category,
            stage,
            message,
        }
    }
}
