use async_trait::async_trait;

use crate::application::ports::{SynthesisEngine, SynthesisError};
use crate::domain::{SynthesisOptions, Voice};

/// Client for the Coqui TTS demo server (`tts-server`), which serves one
/// model and returns WAV from `GET /api/tts`.
pub struct CoquiTtsEngine {
    client: reqwest::Client,
    base_url: String,
    multilingual: bool,
}

impl CoquiTtsEngine {
    pub fn new(base_url: String, multilingual: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            multilingual,
        }
    }
}

#[async_trait]
impl SynthesisEngine for CoquiTtsEngine {
    fn name(&self) -> &str {
        "coqui-tts"
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &Voice,
        _options: &SynthesisOptions,
    ) -> Result<Vec<u8>, SynthesisError> {
        let url = format!("{}/api/tts", self.base_url);

        let mut query: Vec<(&str, String)> = vec![("text", text.to_string())];
        query.push(("speaker_id", voice.speaker.clone().unwrap_or_default()));
        if self.multilingual {
            query.push(("language_id", voice.language.to_string()));
        }

        tracing::debug!(
            voice = %voice.id,
            chars = text.chars().count(),
            "Requesting speech from Coqui TTS"
        );

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| SynthesisError::ApiRequestFailed(format!("request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            if status.is_client_error() {
                return Err(SynthesisError::InputRejected(format!("status {}: {}", status, body)));
            }
            return Err(SynthesisError::SynthesisFailed(format!("status {}: {}", status, body)));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::ApiRequestFailed(format!("body: {}", e)))?;

        tracing::info!(voice = %voice.id, bytes = audio.len(), "Coqui TTS synthesis completed");
        Ok(audio.to_vec())
    }

    async fn health_check(&self) -> Result<(), SynthesisError> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .map_err(|e| SynthesisError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            return Err(SynthesisError::ApiRequestFailed(format!(
                "status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
