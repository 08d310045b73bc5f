use async_trait::async_trait;

use crate::domain::{LanguageCode, LanguagePair};

#[async_trait]
pub trait TranslationEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Directed pairs the installed models can translate in one hop.
    async fn language_pairs(&self) -> Result<Vec<LanguagePair>, TranslationError>;

    async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String, TranslationError>;

    async fn health_check(&self) -> Result<(), TranslationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("translation engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("no model for {source_language} -> {target_language}")]
    UnsupportedPair {
        source_language: String,
        target_language: String,
    },
    #[error("translation failed: {0}")]
    TranslationFailed(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
}
