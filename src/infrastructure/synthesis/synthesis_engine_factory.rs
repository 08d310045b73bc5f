use std::sync::Arc;

use crate::application::ports::SynthesisEngine;
use crate::presentation::config::SynthesisProvider;

use super::coqui_tts_engine::CoquiTtsEngine;
use super::mock_synthesis_engine::MockSynthesisEngine;

pub struct SynthesisEngineFactory;

impl SynthesisEngineFactory {
    pub fn create(
        provider: SynthesisProvider,
        base_url: String,
        multilingual: bool,
    ) -> Arc<dyn SynthesisEngine> {
        match provider {
            SynthesisProvider::Coqui => {
                tracing::info!(base_url = %base_url, multilingual, "Using Coqui TTS synthesis engine");
                Arc::new(CoquiTtsEngine::new(base_url, multilingual))
            }
            SynthesisProvider::Mock => {
                tracing::info!("Using mock synthesis engine");
                Arc::new(MockSynthesisEngine)
            }
        }
    }
}
