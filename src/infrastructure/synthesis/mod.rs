mod coqui_tts_engine;
mod mock_synthesis_engine;
mod synthesis_engine_factory;

pub use coqui_tts_engine::CoquiTtsEngine;
pub use mock_synthesis_engine::MockSynthesisEngine;
pub use synthesis_engine_factory::SynthesisEngineFactory;
