use async_trait::async_trait;

use crate::application::ports::{TranslationEngine, TranslationError};
use crate::domain::{LanguageCode, LanguagePair};

/// Deterministic stand-in: prefixes the text with the target language.
pub struct MockTranslationEngine {
    pairs: Vec<LanguagePair>,
}

impl MockTranslationEngine {
    pub fn new(pairs: Vec<LanguagePair>) -> Self {
        Self { pairs }
    }

    /// Every directed pair between the given languages.
    pub fn fully_connected(languages: &[LanguageCode]) -> Self {
        let pairs = languages
            .iter()
            .flat_map(|s| {
                languages
                    .iter()
                    .filter(move |t| *t != s)
                    .map(move |t| LanguagePair::new(s.clone(), t.clone()))
            })
            .collect();
        Self { pairs }
    }
}

#[async_trait]
impl TranslationEngine for MockTranslationEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn language_pairs(&self) -> Result<Vec<LanguagePair>, TranslationError> {
        Ok(self.pairs.clone())
    }

    async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String, TranslationError> {
        let pair = LanguagePair::new(source.clone(), target.clone());
        if !self.pairs.contains(&pair) {
            return Err(TranslationError::UnsupportedPair {
                source_language: source.to_string(),
                target_language: target.to_string(),
            });
        }
        Ok(format!("[{}] {}", target, text))
    }

    async fn health_check(&self) -> Result<(), TranslationError> {
        Ok(())
    }
}
