use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::application::ports::{ArtifactStore, AudioProbe, SynthesisEngine, SynthesisError};
use crate::domain::{
    ArtifactKind, JobId, Stage, SynthesisOptions, SynthesisResult, VoiceSelection,
};

use super::transcription_adapter::probe_blocking;
use super::{StageError, VoiceCatalog};

#[derive(Debug, Clone)]
pub struct SynthesisPolicy {
    pub max_text_chars: usize,
    pub min_chars_per_second: f64,
    pub max_chars_per_second: f64,
    pub timeout: Duration,
}

pub struct SynthesisAdapter {
    engine: Arc<dyn SynthesisEngine>,
    store: Arc<dyn ArtifactStore>,
    probe: Arc<dyn AudioProbe>,
    voices: VoiceCatalog,
    policy: SynthesisPolicy,
}

impl SynthesisAdapter {
    pub fn new(
        engine: Arc<dyn SynthesisEngine>,
        store: Arc<dyn ArtifactStore>,
        probe: Arc<dyn AudioProbe>,
        voices: VoiceCatalog,
        policy: SynthesisPolicy,
    ) -> Self {
        Self {
            engine,
            store,
            probe,
            voices,
            policy,
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn voices(&self) -> &VoiceCatalog {
        &self.voices
    }

    pub async fn health_check(&self) -> Result<(), String> {
        match tokio::time::timeout(self.policy.timeout, self.engine.health_check()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "health check timed out after {:?}",
                self.policy.timeout
            )),
        }
    }

    pub async fn synthesize(
        &self,
        owner: JobId,
        text: &str,
        selection: &VoiceSelection,
        options: &SynthesisOptions,
    ) -> Result<SynthesisResult, StageError> {
        let voice = self.voices.resolve(selection).ok_or_else(|| {
            StageError::UnsupportedVoice(match selection {
                VoiceSelection::Voice(id) => id.clone(),
                VoiceSelection::Language(code) => format!("no voice for language {}", code),
            })
        })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(StageError::engine(Stage::Synthesis, "nothing to synthesize"));
        }
        let length = text.chars().count();
        if length > self.policy.max_text_chars {
            return Err(StageError::TextTooLong {
                length,
                limit: self.policy.max_text_chars,
            });
        }

        let call = self.engine.synthesize(text, voice, options);
        let audio = tokio::time::timeout(self.policy.timeout, call)
            .await
            .map_err(|_| StageError::EngineTimeout {
                stage: Stage::Synthesis,
                timeout: self.policy.timeout,
            })?
            .map_err(map_engine_error)?;

        let audio = Bytes::from(audio);
        let info = probe_blocking(Arc::clone(&self.probe), audio.clone())
            .await
            .map_err(|e| {
                StageError::engine(Stage::Synthesis, format!("engine returned invalid audio: {}", e))
            })?;

        self.check_speaking_rate(length, info.duration_secs);

        let artifact = self
            .store
            .put(owner, ArtifactKind::SynthesizedAudio, audio, "audio/wav")
            .await?;

        tracing::info!(
            engine = self.engine.name(),
            voice = %voice.id,
            language = %voice.language,
            chars = length,
            duration_secs = info.duration_secs,
            "Speech synthesis completed"
        );

        Ok(SynthesisResult {
            artifact: artifact.id,
            voice: voice.id.clone(),
            language: voice.language.clone(),
            duration_secs: info.duration_secs,
        })
    }

    fn check_speaking_rate(&self, chars: usize, duration_secs: f64) {
        if duration_secs <= 0.0 {
            tracing::warn!(chars = chars, "Synthesized audio has zero duration");
            return;
        }
        let rate = chars as f64 / duration_secs;
        if rate < self.policy.min_chars_per_second || rate > self.policy.max_chars_per_second {
            tracing::warn!(
                chars = chars,
                duration_secs = duration_secs,
                chars_per_second = rate,
                "Synthesized audio duration outside expected speaking rate"
            );
        }
    }
}

fn map_engine_error(e: SynthesisError) -> StageError {
    match e {
        SynthesisError::UnknownVoice(voice) => StageError::UnsupportedVoice(voice),
        other => StageError::engine(Stage::Synthesis, other.to_string()),
    }
}
