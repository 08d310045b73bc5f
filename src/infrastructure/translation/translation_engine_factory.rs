use std::sync::Arc;

use crate::application::ports::TranslationEngine;
use crate::domain::LanguageCode;
use crate::presentation::config::TranslationProvider;

use super::libretranslate_engine::LibreTranslateEngine;
use super::mock_translation_engine::MockTranslationEngine;

pub struct TranslationEngineFactory;

impl TranslationEngineFactory {
    /// `languages` seeds the mock engine's fully connected pair table.
    pub fn create(
        provider: TranslationProvider,
        base_url: String,
        api_key: Option<String>,
        languages: &[LanguageCode],
    ) -> Arc<dyn TranslationEngine> {
        match provider {
            TranslationProvider::LibreTranslate => {
                tracing::info!(base_url = %base_url, "Using LibreTranslate translation engine");
                Arc::new(LibreTranslateEngine::new(base_url, api_key))
            }
            TranslationProvider::Mock => {
                tracing::info!(languages = languages.len(), "Using mock translation engine");
                Arc::new(MockTranslationEngine::fully_connected(languages))
            }
        }
    }
}
