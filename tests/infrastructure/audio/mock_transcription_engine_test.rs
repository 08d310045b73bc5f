use std::time::{Duration, Instant};

use voxbridge::application::ports::TranscriptionEngine;
use voxbridge::domain::TranscriptionOptions;
use voxbridge::infrastructure::audio::MockTranscriptionEngine;

use crate::helpers::lang;

#[tokio::test]
async fn given_language_hint_when_transcribing_then_hint_overrides_fixed_language() {
    let engine = MockTranscriptionEngine::new();
    let options = TranscriptionOptions {
        language: Some(lang("de")),
        ..TranscriptionOptions::default()
    };

    let transcript = engine.transcribe(b"audio", "a.wav", &options).await.unwrap();

    assert_eq!(transcript.language, Some(lang("de")));
    assert_eq!(transcript.segments.len(), 1);
}

#[tokio::test]
async fn given_blank_transcript_when_transcribing_then_no_segments() {
    let engine = MockTranscriptionEngine::new().with_transcript(None, "  ");

    let transcript = engine
        .transcribe(b"audio", "a.wav", &TranscriptionOptions::default())
        .await
        .unwrap();

    assert!(transcript.segments.is_empty());
}

#[tokio::test]
async fn given_delay_when_transcribing_then_response_is_held() {
    let engine = MockTranscriptionEngine::new().with_delay(Duration::from_millis(50));
    let started = Instant::now();

    engine
        .transcribe(b"audio", "a.wav", &TranscriptionOptions::default())
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(50));
}
