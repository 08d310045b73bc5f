use super::{ArtifactId, LanguageCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelection {
    Voice(String),
    Language(LanguageCode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOptions {
    pub speed: f32,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

/// A voice resolved against the configured voice table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub language: LanguageCode,
    /// Engine-side speaker name, when the engine hosts several per model.
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub artifact: ArtifactId,
    pub voice: String,
    pub language: LanguageCode,
    pub duration_secs: f64,
}
