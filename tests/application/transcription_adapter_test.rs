use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use voxbridge::application::ports::{ArtifactStore, TranscriptionEngine, TranscriptionError};
use voxbridge::application::services::{
    SEGMENT_TOLERANCE_SECS, StageError, TranscriptionAdapter, normalize_segments,
};
use voxbridge::domain::{
    Artifact, ArtifactKind, EngineTranscript, FailureCode, JobId, TranscriptSegment,
    TranscriptionOptions,
};
use voxbridge::infrastructure::audio::{MockTranscriptionEngine, SymphoniaAudioProbe};
use voxbridge::infrastructure::storage::LocalArtifactStore;

use crate::helpers::{create_test_store, lang, wav_bytes};

struct ScriptedEngine {
    segments: Vec<TranscriptSegment>,
    failure: Option<fn() -> TranscriptionError>,
    delay: Duration,
}

impl ScriptedEngine {
    fn returning(segments: Vec<TranscriptSegment>) -> Self {
        Self {
            segments,
            failure: None,
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl TranscriptionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn transcribe(
        &self,
        _audio_data: &[u8],
        _file_name: &str,
        _options: &TranscriptionOptions,
    ) -> Result<EngineTranscript, TranscriptionError> {
        tokio::time::sleep(self.delay).await;
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        Ok(EngineTranscript {
            language: Some(lang("en")),
            segments: self.segments.clone(),
        })
    }

    async fn health_check(&self) -> Result<(), TranscriptionError> {
        Ok(())
    }
}

async fn stored_source(store: &Arc<LocalArtifactStore>, data: Vec<u8>) -> Artifact {
    store
        .put(JobId::new(), ArtifactKind::SourceAudio, Bytes::from(data), "audio/wav")
        .await
        .unwrap()
}

fn adapter(
    engine: impl TranscriptionEngine + 'static,
    store: &Arc<LocalArtifactStore>,
    timeout: Duration,
) -> TranscriptionAdapter {
    TranscriptionAdapter::new(
        Arc::new(engine),
        store.clone(),
        Arc::new(SymphoniaAudioProbe::new()),
        timeout,
    )
}

#[test]
fn given_overlapping_segments_when_normalizing_then_start_moves_past_previous_end() {
    let segments = vec![
        TranscriptSegment::new(2.0, 4.0, "second"),
        TranscriptSegment::new(0.0, 2.5, "first"),
    ];

    let normalized = normalize_segments(segments, 10.0);

    assert_eq!(normalized.len(), 2);
    assert_eq!(normalized[0].text, "first");
    assert_eq!(normalized[1].text, "second");
    assert!(normalized[1].start >= normalized[0].end);
}

#[test]
fn given_segment_past_duration_when_normalizing_then_clamped_to_tolerance() {
    let segments = vec![
        TranscriptSegment::new(0.0, 4.0, "spoken"),
        TranscriptSegment::new(4.0, 30.0, "trailing"),
    ];

    let normalized = normalize_segments(segments, 5.0);

    let last = normalized.last().unwrap();
    assert!(last.end <= 5.0 + SEGMENT_TOLERANCE_SECS);
}

#[test]
fn given_segment_collapsed_by_clamping_when_normalizing_then_text_folded_into_previous() {
    let segments = vec![
        TranscriptSegment::new(0.0, 5.5, "all of it"),
        TranscriptSegment::new(8.0, 9.0, "hallucinated tail"),
    ];

    let normalized = normalize_segments(segments, 5.0);

    assert_eq!(normalized.len(), 1);
    assert_eq!(normalized[0].text, "all of it hallucinated tail");
}

#[test]
fn given_blank_and_non_finite_segments_when_normalizing_then_dropped() {
    let segments = vec![
        TranscriptSegment::new(0.0, 1.0, "   "),
        TranscriptSegment::new(f64::NAN, 2.0, "broken"),
        TranscriptSegment::new(1.0, 2.0, " kept "),
    ];

    let normalized = normalize_segments(segments, 3.0);

    assert_eq!(normalized.len(), 1);
    assert_eq!(normalized[0].text, "kept");
}

#[tokio::test]
async fn given_wav_source_when_transcribing_then_segments_within_duration() {
    let (_dir, store) = create_test_store(Duration::from_secs(60), u64::MAX);
    let source = stored_source(&store, wav_bytes(3.0, 16_000)).await;
    let adapter = adapter(MockTranscriptionEngine::new(), &store, Duration::from_secs(5));

    let transcript = adapter
        .transcribe(&source, &TranscriptionOptions::default())
        .await
        .unwrap();

    assert!((transcript.source_duration_secs - 3.0).abs() < 0.01);
    assert_eq!(transcript.segments.len(), 1);
    assert!(transcript.segments[0].end <= 3.0 + SEGMENT_TOLERANCE_SECS);
    assert_eq!(transcript.language, Some(lang("en")));
}

#[tokio::test]
async fn given_engine_without_language_when_hint_given_then_hint_used() {
    let (_dir, store) = create_test_store(Duration::from_secs(60), u64::MAX);
    let source = stored_source(&store, wav_bytes(1.0, 16_000)).await;
    let engine = MockTranscriptionEngine::new().with_transcript(None, "bonjour");
    let adapter = adapter(engine, &store, Duration::from_secs(5));
    let options = TranscriptionOptions {
        language: Some(lang("fr")),
        ..TranscriptionOptions::default()
    };

    let transcript = adapter.transcribe(&source, &options).await.unwrap();

    assert_eq!(transcript.language, Some(lang("fr")));
}

#[tokio::test]
async fn given_non_audio_bytes_when_transcribing_then_unsupported_format() {
    let (_dir, store) = create_test_store(Duration::from_secs(60), u64::MAX);
    let source = stored_source(&store, b"definitely not audio".to_vec()).await;
    let adapter = adapter(MockTranscriptionEngine::new(), &store, Duration::from_secs(5));

    let err = adapter
        .transcribe(&source, &TranscriptionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), FailureCode::UnsupportedFormat);
}

#[tokio::test]
async fn given_engine_returns_nothing_when_transcribing_then_no_speech_detected() {
    let (_dir, store) = create_test_store(Duration::from_secs(60), u64::MAX);
    let source = stored_source(&store, wav_bytes(1.0, 16_000)).await;
    let adapter = adapter(ScriptedEngine::returning(Vec::new()), &store, Duration::from_secs(5));

    let err = adapter
        .transcribe(&source, &TranscriptionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, StageError::NoSpeechDetected));
}

#[tokio::test]
async fn given_slow_engine_when_transcribing_then_engine_timeout() {
    let (_dir, store) = create_test_store(Duration::from_secs(60), u64::MAX);
    let source = stored_source(&store, wav_bytes(1.0, 16_000)).await;
    let engine = ScriptedEngine {
        delay: Duration::from_secs(5),
        ..ScriptedEngine::returning(vec![TranscriptSegment::new(0.0, 1.0, "late")])
    };
    let adapter = adapter(engine, &store, Duration::from_millis(50));

    let err = adapter
        .transcribe(&source, &TranscriptionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), FailureCode::EngineTimeout);
}

#[tokio::test]
async fn given_engine_error_when_transcribing_then_mapped_to_engine_failure() {
    let (_dir, store) = create_test_store(Duration::from_secs(60), u64::MAX);
    let source = stored_source(&store, wav_bytes(1.0, 16_000)).await;
    let engine = ScriptedEngine {
        failure: Some(|| TranscriptionError::ApiRequestFailed("HTTP 500".to_string())),
        ..ScriptedEngine::returning(Vec::new())
    };
    let adapter = adapter(engine, &store, Duration::from_secs(5));

    let err = adapter
        .transcribe(&source, &TranscriptionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), FailureCode::EngineFailure);
    assert!(err.to_string().contains("HTTP 500"));
}

#[tokio::test]
async fn given_engine_rejects_format_when_transcribing_then_unsupported_format() {
    let (_dir, store) = create_test_store(Duration::from_secs(60), u64::MAX);
    let source = stored_source(&store, wav_bytes(1.0, 16_000)).await;
    let engine = ScriptedEngine {
        failure: Some(|| TranscriptionError::UnsupportedFormat("codec".to_string())),
        ..ScriptedEngine::returning(Vec::new())
    };
    let adapter = adapter(engine, &store, Duration::from_secs(5));

    let err = adapter
        .transcribe(&source, &TranscriptionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), FailureCode::UnsupportedFormat);
}
