mod libretranslate_engine;
mod mock_translation_engine;
mod translation_engine_factory;

pub use libretranslate_engine::LibreTranslateEngine;
pub use mock_translation_engine::MockTranslationEngine;
pub use translation_engine_factory::TranslationEngineFactory;
