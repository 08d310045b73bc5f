use super::{Settings, SynthesisProvider, TranscriptionProvider, TranslationProvider};

/// Scaffold mode runs the whole pipeline on mock engines.
#[derive(Debug, Clone)]
pub struct ScaffoldConfig {
    pub enabled: bool,
    pub mock_response_delay_ms: u64,
}

impl ScaffoldConfig {
    pub fn apply(&self, settings: &mut Settings) {
        if !self.enabled {
            return;
        }
        settings.transcription.provider = TranscriptionProvider::Mock;
        settings.translation.provider = TranslationProvider::Mock;
        settings.synthesis.provider = SynthesisProvider::Mock;
    }
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            enabled: std::env::var("SCAFFOLD_MODE")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            mock_response_delay_ms: std::env::var("MOCK_RESPONSE_DELAY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }
}
