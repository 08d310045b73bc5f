use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{TranslationEngine, TranslationError};
use crate::domain::{LanguageCode, LanguagePair};

pub struct LibreTranslateEngine {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LanguageEntry {
    code: String,
    #[serde(default)]
    targets: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl LibreTranslateEngine {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    async fn fetch_languages(&self) -> Result<Vec<LanguageEntry>, TranslationError> {
        let url = format!("{}/languages", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TranslationError::EngineUnavailable(format!("request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::EngineUnavailable(format!("status {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| TranslationError::ApiRequestFailed(format!("languages body: {}", e)))
    }
}

#[async_trait]
impl TranslationEngine for LibreTranslateEngine {
    fn name(&self) -> &str {
        "libretranslate"
    }

    async fn language_pairs(&self) -> Result<Vec<LanguagePair>, TranslationError> {
        let entries = self.fetch_languages().await?;
        let mut pairs = Vec::new();

        for entry in entries {
            let Ok(source) = LanguageCode::parse(&entry.code) else {
                tracing::debug!(code = %entry.code, "Skipping non ISO 639 language");
                continue;
            };
            for target in entry.targets {
                match LanguageCode::parse(&target) {
                    Ok(target) if target != source => {
                        pairs.push(LanguagePair::new(source.clone(), target))
                    }
                    _ => {}
                }
            }
        }
        Ok(pairs)
    }

    async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String, TranslationError> {
        let url = format!("{}/translate", self.base_url);
        let body = TranslateRequest {
            q: text,
            source: source.as_str(),
            target: target.as_str(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslationError::EngineUnavailable(format!("request: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let parsed: TranslateResponse = response
                .json()
                .await
                .map_err(|e| TranslationError::ApiRequestFailed(format!("body: {}", e)))?;
            return Ok(parsed.translated_text);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .map(|e| e.error)
            .unwrap_or(raw);

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(TranslationError::EngineUnavailable(message));
        }
        let unsupported = message.to_lowercase().contains("not supported");
        if status == reqwest::StatusCode::BAD_REQUEST && unsupported {
            return Err(TranslationError::UnsupportedPair {
                source_language: source.to_string(),
                target_language: target.to_string(),
            });
        }
        Err(TranslationError::TranslationFailed(format!(
            "status {}: {}",
            status, message
        )))
    }

    async fn health_check(&self) -> Result<(), TranslationError> {
        self.fetch_languages().await.map(|_| ())
    }
}
