mod audio_decoder;
#[cfg(feature = "local-whisper")]
mod candle_whisper_engine;
mod mock_transcription_engine;
mod openai_whisper_engine;
mod pcm_wav;
mod transcription_engine_factory;

#[cfg(feature = "local-whisper")]
pub use audio_decoder::decode_to_mono_pcm;
pub use audio_decoder::SymphoniaAudioProbe;
#[cfg(feature = "local-whisper")]
pub use candle_whisper_engine::CandleWhisperEngine;
pub use mock_transcription_engine::MockTranscriptionEngine;
pub use openai_whisper_engine::OpenAiWhisperEngine;
pub use pcm_wav::encode_pcm16_wav;
pub use transcription_engine_factory::TranscriptionEngineFactory;
