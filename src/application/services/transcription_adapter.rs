use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    ArtifactStore, AudioInfo, AudioProbe, TranscriptionEngine, TranscriptionError,
};
use crate::domain::{Artifact, Stage, Transcript, TranscriptSegment, TranscriptionOptions};

use super::StageError;

/// Allowed overshoot of segment ends past the probed source duration.
pub const SEGMENT_TOLERANCE_SECS: f64 = 0.5;

pub struct TranscriptionAdapter {
    engine: Arc<dyn TranscriptionEngine>,
    store: Arc<dyn ArtifactStore>,
    probe: Arc<dyn AudioProbe>,
    timeout: Duration,
}

impl TranscriptionAdapter {
    pub fn new(
        engine: Arc<dyn TranscriptionEngine>,
        store: Arc<dyn ArtifactStore>,
        probe: Arc<dyn AudioProbe>,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            store,
            probe,
            timeout,
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub async fn health_check(&self) -> Result<(), String> {
        match tokio::time::timeout(self.timeout, self.engine.health_check()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("health check timed out after {:?}", self.timeout)),
        }
    }

    pub async fn transcribe(
        &self,
        audio: &Artifact,
        options: &TranscriptionOptions,
    ) -> Result<Transcript, StageError> {
        let data = self.store.get(&audio.id).await?;

        let info = probe_blocking(Arc::clone(&self.probe), data.clone()).await?;
        tracing::debug!(
            duration_secs = info.duration_secs,
            sample_rate = info.sample_rate,
            channels = info.channels,
            "Source audio probed"
        );

        let call = self
            .engine
            .transcribe(&data, audio.path.file_name(), options);
        let raw = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| StageError::EngineTimeout {
                stage: Stage::Transcription,
                timeout: self.timeout,
            })?
            .map_err(map_engine_error)?;

        let raw_count = raw.segments.len();
        let segments = normalize_segments(raw.segments, info.duration_secs);
        if segments.is_empty() {
            return Err(StageError::NoSpeechDetected);
        }

        let transcript = Transcript {
            language: raw.language.or_else(|| options.language.clone()),
            segments,
            source_duration_secs: info.duration_secs,
        };

        tracing::info!(
            engine = self.engine.name(),
            raw_segments = raw_count,
            segments = transcript.segments.len(),
            covered_secs = transcript.covered_duration(),
            language = transcript.language.as_ref().map(|l| l.as_str()),
            "Transcription completed"
        );

        Ok(transcript)
    }
}

pub(crate) async fn probe_blocking(
    probe: Arc<dyn AudioProbe>,
    data: bytes::Bytes,
) -> Result<AudioInfo, StageError> {
    tokio::task::spawn_blocking(move || probe.probe(&data))
        .await
        .map_err(|e| StageError::Internal(format!("audio probe task: {}", e)))?
        .map_err(|e| StageError::UnsupportedFormat(e.to_string()))
}

fn map_engine_error(e: TranscriptionError) -> StageError {
    match e {
        TranscriptionError::DecodingFailed(msg) | TranscriptionError::UnsupportedFormat(msg) => {
            StageError::UnsupportedFormat(msg)
        }
        other => StageError::engine(Stage::Transcription, other.to_string()),
    }
}

/// Sorts segments by start, removes overlaps and clamps them to the source
/// duration. Text of segments that collapse to nothing is folded into the
/// preceding segment so no words are lost.
pub fn normalize_segments(
    mut segments: Vec<TranscriptSegment>,
    source_duration_secs: f64,
) -> Vec<TranscriptSegment> {
    segments.retain(|s| !s.text.trim().is_empty() && s.start.is_finite() && s.end.is_finite());
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    let limit = source_duration_secs.max(0.0) + SEGMENT_TOLERANCE_SECS;
    let mut normalized: Vec<TranscriptSegment> = Vec::with_capacity(segments.len());
    let mut cursor = 0.0_f64;

    for mut segment in segments {
        segment.text = segment.text.trim().to_string();
        segment.start = segment.start.max(cursor).min(limit);
        segment.end = segment.end.min(limit);

        if segment.end <= segment.start {
            match normalized.last_mut() {
                Some(previous) => {
                    previous.text.push(' ');
                    previous.text.push_str(&segment.text);
                }
                None => {
                    segment.end = segment.start;
                    normalized.push(segment);
                }
            }
            continue;
        }

        cursor = segment.end;
        normalized.push(segment);
    }

    normalized
}

