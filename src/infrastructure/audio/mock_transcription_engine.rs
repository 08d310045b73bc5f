use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::domain::{EngineTranscript, LanguageCode, TranscriptSegment, TranscriptionOptions};

/// Returns a fixed transcript as one segment spanning the whole clip.
pub struct MockTranscriptionEngine {
    text: String,
    language: Option<LanguageCode>,
    delay: Duration,
}

impl MockTranscriptionEngine {
    pub fn new() -> Self {
        Self {
            text: "This is a mock transcript of the uploaded audio clip.".to_string(),
            language: LanguageCode::parse("en").ok(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_transcript(mut self, language: Option<LanguageCode>, text: impl Into<String>) -> Self {
        self.language = language;
        self.text = text.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for MockTranscriptionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptionEngine for MockTranscriptionEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcribe(
        &self,
        _audio_data: &[u8],
        _file_name: &str,
        options: &TranscriptionOptions,
    ) -> Result<EngineTranscript, TranscriptionError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        // The end is clamped to the real clip duration by the adapter.
        let segments = if self.text.trim().is_empty() {
            Vec::new()
        } else {
            vec![TranscriptSegment::new(0.0, f64::MAX, self.text.clone())]
        };

        Ok(EngineTranscript {
            language: options.language.clone().or_else(|| self.language.clone()),
            segments,
        })
    }

    async fn health_check(&self) -> Result<(), TranscriptionError> {
        Ok(())
    }
}
