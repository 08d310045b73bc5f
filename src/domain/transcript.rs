use serde::Serialize;

use super::LanguageCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscriptionTask {
    #[default]
    Transcribe,
    TranslateToEnglish,
}

impl TranscriptionTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::TranslateToEnglish => "translate-to-english",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "transcribe" => Some(Self::Transcribe),
            "translate-to-english" | "translate" => Some(Self::TranslateToEnglish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptionOptions {
    /// `None` asks the engine to detect the spoken language.
    pub language: Option<LanguageCode>,
    pub task: TranscriptionTask,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            confidence: None,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Raw engine output before the adapter normalizes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineTranscript {
    pub language: Option<LanguageCode>,
    pub segments: Vec<TranscriptSegment>,
}

/// Ordered, non-overlapping segments covering at most the source duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub language: Option<LanguageCode>,
    pub segments: Vec<TranscriptSegment>,
    pub source_duration_secs: f64,
}

impl Transcript {
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn covered_duration(&self) -> f64 {
        self.segments.iter().map(TranscriptSegment::duration).sum()
    }
}
