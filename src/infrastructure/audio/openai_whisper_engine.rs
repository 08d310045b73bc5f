use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::domain::{
    EngineTranscript, LanguageCode, TranscriptSegment, TranscriptionOptions, TranscriptionTask,
};

/// Any server speaking the OpenAI `/audio/transcriptions` protocol.
pub struct OpenAiWhisperEngine {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
    #[serde(default)]
    avg_logprob: Option<f64>,
}

impl OpenAiWhisperEngine {
    pub fn new(api_key: Option<String>, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| "whisper-1".to_string()),
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl TranscriptionEngine for OpenAiWhisperEngine {
    fn name(&self) -> &str {
        "openai-whisper"
    }

    async fn transcribe(
        &self,
        audio_data: &[u8],
        file_name: &str,
        options: &TranscriptionOptions,
    ) -> Result<EngineTranscript, TranscriptionError> {
        let endpoint = match options.task {
            TranscriptionTask::Transcribe => "transcriptions",
            TranscriptionTask::TranslateToEnglish => "translations",
        };
        let url = format!("{}/audio/{}", self.base_url, endpoint);

        let file_part = multipart::Part::bytes(audio_data.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("mime: {}", e)))?;

        let mut form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .part("file", file_part);
        if let (TranscriptionTask::Transcribe, Some(language)) = (options.task, &options.language) {
            form = form.text("language", language.to_string());
        }

        tracing::debug!(
            model = %self.model,
            task = options.task.as_str(),
            "Sending audio to Whisper API"
        );

        let response = self
            .request(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            if status == reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE {
                return Err(TranscriptionError::UnsupportedFormat(body));
            }
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("body: {}", e)))?;

        let language = match options.task {
            TranscriptionTask::TranslateToEnglish => LanguageCode::parse("en").ok(),
            TranscriptionTask::Transcribe => body
                .language
                .as_deref()
                .and_then(language_from_whisper)
                .or_else(|| options.language.clone()),
        };

        let segments = if body.segments.is_empty() {
            // Plain servers without segment support still return the full text.
            match (body.text.trim(), body.duration) {
                ("", _) => Vec::new(),
                (text, duration) => {
                    vec![TranscriptSegment::new(0.0, duration.unwrap_or(f64::MAX), text)]
                }
            }
        } else {
            body.segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    start: s.start,
                    end: s.end,
                    text: s.text.trim().to_string(),
                    confidence: s.avg_logprob.map(|lp| lp.exp().clamp(0.0, 1.0) as f32),
                })
                .collect()
        };

        tracing::info!(
            segments = segments.len(),
            language = language.as_ref().map(|l| l.as_str()),
            "Whisper API transcription completed"
        );

        Ok(EngineTranscript { language, segments })
    }

    async fn health_check(&self) -> Result<(), TranscriptionError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Whisper servers report either an ISO code or the English language name.
fn language_from_whisper(raw: &str) -> Option<LanguageCode> {
    if let Ok(code) = LanguageCode::parse(raw) {
        return Some(code);
    }
    let code = match raw.trim().to_ascii_lowercase().as_str() {
        "english" => "en",
        "spanish" => "es",
        "french" => "fr",
        "german" => "de",
        "italian" => "it",
        "portuguese" => "pt",
        "russian" => "ru",
        "japanese" => "ja",
        "korean" => "ko",
        "chinese" => "zh",
        "arabic" => "ar",
        "hindi" => "hi",
        "finnish" => "fi",
        "swedish" => "sv",
        "norwegian" => "no",
        "danish" => "da",
        "dutch" => "nl",
        "polish" => "pl",
        "czech" => "cs",
        "slovak" => "sk",
        "ukrainian" => "uk",
        "turkish" => "tr",
        _ => return None,
    };
    LanguageCode::parse(code).ok()
}
