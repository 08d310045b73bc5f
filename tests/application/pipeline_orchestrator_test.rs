use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use voxbridge::application::ports::{
    ArtifactStore, ArtifactStoreError, AudioProbe, TranscriptionEngine, TranscriptionError,
};
use voxbridge::application::services::{CancelOutcome, OrchestratorError, SubmitRequest};
use voxbridge::domain::{
    ErrorCategory, EngineTranscript, FailureCode, JobId, JobRequest, JobState, Stage,
    StorageTier, TranscriptionOptions, TranscriptionTask,
};
use voxbridge::infrastructure::audio::SymphoniaAudioProbe;

use crate::helpers::{
    CountingSynthesisEngine, ENGLISH_SCRIPT, GatedTranscriptionEngine, Pipeline, PipelineBuilder,
    lang, wav_bytes, wait_until,
};

fn request(target: Option<&str>, synthesize: bool) -> JobRequest {
    JobRequest {
        filename: "meeting.wav".to_string(),
        source_language: None,
        task: TranscriptionTask::Transcribe,
        target_language: target.map(lang),
        synthesize,
        voice: None,
    }
}

fn submission(request: JobRequest, seconds: f64) -> SubmitRequest {
    SubmitRequest {
        request,
        data: Bytes::from(wav_bytes(seconds, 16_000)),
        content_type: "audio/wav".to_string(),
    }
}

async fn submit(pipeline: &Pipeline, request: JobRequest) -> JobId {
    pipeline
        .orchestrator
        .submit(submission(request, 5.0))
        .await
        .unwrap()
}

#[tokio::test]
async fn given_english_clip_when_translating_and_synthesizing_then_job_completes_with_audio() {
    let pipeline = PipelineBuilder::new().build();

    let job_id = submit(&pipeline, request(Some("es"), true)).await;
    let job = pipeline.wait_terminal(job_id).await;

    assert_eq!(job.state, JobState::Completed, "failure: {:?}", job.failure);
    let result = job.result.unwrap();
    assert_eq!(result.detected_language, Some(lang("en")));
    assert!(result.transcript.is_some());
    assert!(result.translation.is_some());

    let audio_id = result.audio.unwrap();
    let audio = pipeline.store.get(&audio_id).await.unwrap();
    let info = SymphoniaAudioProbe::new().probe(&audio).unwrap();
    assert!(
        info.duration_secs >= 2.5 && info.duration_secs <= 10.0,
        "synthesized duration {} outside expected range",
        info.duration_secs
    );

    let translation = pipeline.store.get(&result.translation.unwrap()).await.unwrap();
    let translation = String::from_utf8(translation.to_vec()).unwrap();
    assert_eq!(translation, format!("[es] {}", ENGLISH_SCRIPT));
}

#[tokio::test]
async fn given_completed_job_when_reading_status_then_artifacts_are_promoted() {
    let pipeline = PipelineBuilder::new().build();

    let job_id = submit(&pipeline, request(Some("es"), true)).await;
    pipeline.wait_terminal(job_id).await;
    let snapshot = pipeline.orchestrator.status(job_id).await.unwrap().unwrap();

    assert_eq!(snapshot.artifacts.len(), 3);
    assert!(snapshot.artifacts.iter().all(|a| a.tier == StorageTier::Output));
    assert!(snapshot.job.partial_artifacts.is_empty());
}

#[tokio::test]
async fn given_transcription_only_request_when_processed_then_segments_bounded_by_clip() {
    let pipeline = PipelineBuilder::new().build();

    let job_id = submit(&pipeline, request(None, false)).await;
    let job = pipeline.wait_terminal(job_id).await;

    assert_eq!(job.state, JobState::Completed);
    let result = job.result.unwrap();
    assert!(result.translation.is_none());
    assert!(result.audio.is_none());
    assert!(result.segments.iter().all(|s| s.end <= 5.5 && s.start <= s.end));
}

#[tokio::test]
async fn given_target_equal_to_source_when_processed_then_translation_skipped() {
    let pipeline = PipelineBuilder::new().build();

    let job_id = submit(&pipeline, request(Some("en"), false)).await;
    let job = pipeline.wait_terminal(job_id).await;

    assert_eq!(job.state, JobState::Completed);
    assert!(job.result.unwrap().translation.is_none());
}

#[tokio::test]
async fn given_unsupported_pair_when_processed_then_fails_without_synthesis() {
    let synthesis = Arc::new(CountingSynthesisEngine::default());
    let pipeline = PipelineBuilder::new().synthesis(synthesis.clone()).build();
    let mut req = request(Some("es"), true);
    req.source_language = Some(lang("xx"));

    let job_id = submit(&pipeline, req).await;
    let job = pipeline.wait_terminal(job_id).await;

    assert_eq!(job.state, JobState::Failed);
    let failure = job.failure.unwrap();
    assert_eq!(failure.code, FailureCode::UnsupportedLanguagePair);
    assert_eq!(failure.stage, Some(Stage::Translation));
    assert_eq!(synthesis.calls(), 0);
}

#[tokio::test]
async fn given_failed_job_when_reading_diagnostics_then_partial_transcript_listed() {
    let pipeline = PipelineBuilder::new().build();
    let mut req = request(Some("es"), false);
    req.source_language = Some(lang("xx"));

    let job_id = submit(&pipeline, req).await;
    pipeline.wait_terminal(job_id).await;

    let partials = pipeline.orchestrator.diagnostics(job_id).await.unwrap();
    assert_eq!(partials.len(), 1);

    let err = pipeline
        .orchestrator
        .artifact_for_download(partials[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::ArtifactNotFound(_)));

    let snapshot = pipeline.orchestrator.status(job_id).await.unwrap().unwrap();
    assert!(snapshot.artifacts.is_empty());
}

#[tokio::test]
async fn given_unknown_voice_when_processed_then_fails_in_synthesis() {
    let pipeline = PipelineBuilder::new().build();
    let mut req = request(None, true);
    req.voice = Some("robot".to_string());

    let job_id = submit(&pipeline, req).await;
    let job = pipeline.wait_terminal(job_id).await;

    let failure = job.failure.unwrap();
    assert_eq!(failure.code, FailureCode::UnsupportedVoice);
    assert_eq!(failure.stage, Some(Stage::Synthesis));
}

#[tokio::test]
async fn given_translate_to_english_task_when_synthesizing_then_english_voice_used() {
    struct SpanishEngine;

    #[async_trait]
    impl TranscriptionEngine for SpanishEngine {
        fn name(&self) -> &str {
            "spanish"
        }

        async fn transcribe(
            &self,
            _audio_data: &[u8],
            _file_name: &str,
            options: &TranscriptionOptions,
        ) -> Result<EngineTranscript, TranscriptionError> {
            assert_eq!(options.task, TranscriptionTask::TranslateToEnglish);
            Ok(EngineTranscript {
                language: Some(lang("es")),
                segments: vec![voxbridge::domain::TranscriptSegment::new(
                    0.0,
                    4.0,
                    "Good morning everyone",
                )],
            })
        }

        async fn health_check(&self) -> Result<(), TranscriptionError> {
            Ok(())
        }
    }

    let pipeline = PipelineBuilder::new()
        .transcription(Arc::new(SpanishEngine))
        .build();
    let mut req = request(Some("en"), true);
    req.task = TranscriptionTask::TranslateToEnglish;

    let job_id = submit(&pipeline, req).await;
    let job = pipeline.wait_terminal(job_id).await;

    assert_eq!(job.state, JobState::Completed, "failure: {:?}", job.failure);
    let result = job.result.unwrap();
    assert_eq!(result.detected_language, Some(lang("es")));
    assert!(result.translation.is_none());
    assert!(result.audio.is_some());
}

#[tokio::test]
async fn given_pool_of_two_when_five_jobs_submitted_then_at_most_two_transcribe() {
    let engine = GatedTranscriptionEngine::new();
    let pipeline = PipelineBuilder::new()
        .transcription(engine.clone())
        .transcription_slots(2)
        .build();

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(submit(&pipeline, request(None, false)).await);
    }
    wait_until(|| engine.started() == 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(engine.started(), 2);
    let metrics = pipeline.orchestrator.pools().metrics(Stage::Transcription);
    assert_eq!(metrics.in_flight, 2);

    let mut queued = 0;
    for id in &ids {
        if pipeline.job(*id).await.state == JobState::Queued {
            queued += 1;
        }
    }
    assert_eq!(queued, 3);

    engine.open(5);
    for id in &ids {
        assert_eq!(pipeline.wait_terminal(*id).await.state, JobState::Completed);
    }
    assert!(engine.peak() <= 2);
    assert!(pipeline.orchestrator.pools().metrics(Stage::Transcription).peak <= 2);
}

#[tokio::test]
async fn given_saturated_pool_and_zero_wait_when_job_arrives_then_fails_with_queue_timeout() {
    let engine = GatedTranscriptionEngine::new();
    let pipeline = PipelineBuilder::new()
        .transcription(engine.clone())
        .transcription_slots(2)
        .queue_wait(Duration::ZERO)
        .build();

    let first = submit(&pipeline, request(None, false)).await;
    let second = submit(&pipeline, request(None, false)).await;
    wait_until(|| engine.started() == 2).await;

    let third = submit(&pipeline, request(None, false)).await;
    let rejected = pipeline.wait_terminal(third).await;

    assert_eq!(rejected.state, JobState::Failed);
    let failure = rejected.failure.unwrap();
    assert_eq!(failure.code, FailureCode::QueueTimeout);
    assert_eq!(failure.category, ErrorCategory::ResourceError);

    engine.open(2);
    assert_eq!(pipeline.wait_terminal(first).await.state, JobState::Completed);
    assert_eq!(pipeline.wait_terminal(second).await.state, JobState::Completed);
}

#[tokio::test]
async fn given_job_waiting_for_slot_when_cancelled_then_cancelled_and_upload_released() {
    let engine = GatedTranscriptionEngine::new();
    let pipeline = PipelineBuilder::new()
        .transcription(engine.clone())
        .transcription_slots(1)
        .build();

    let running = submit(&pipeline, request(None, false)).await;
    wait_until(|| engine.started() == 1).await;
    let waiting = submit(&pipeline, request(None, false)).await;
    let source = pipeline.job(waiting).await.source.unwrap();

    let outcome = pipeline.orchestrator.cancel(waiting).await.unwrap();

    assert_eq!(outcome, CancelOutcome::Cancelled);
    assert_eq!(pipeline.job(waiting).await.state, JobState::Cancelled);
    for _ in 0..100 {
        if pipeline.store.metadata(&source).await.is_err() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(matches!(
        pipeline.store.metadata(&source).await,
        Err(ArtifactStoreError::NotFound(_))
    ));

    engine.open(1);
    assert_eq!(pipeline.wait_terminal(running).await.state, JobState::Completed);
    assert_eq!(engine.started(), 1);
}

#[tokio::test]
async fn given_running_job_when_cancelled_then_stage_output_discarded() {
    let engine = GatedTranscriptionEngine::new();
    let pipeline = PipelineBuilder::new().transcription(engine.clone()).build();

    let job_id = submit(&pipeline, request(Some("es"), true)).await;
    pipeline.wait_state(job_id, JobState::Transcribing).await;

    let outcome = pipeline.orchestrator.cancel(job_id).await.unwrap();
    assert_eq!(outcome, CancelOutcome::CancelRequested(Stage::Transcription));

    engine.open(1);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let job = pipeline.job(job_id).await;
    assert_eq!(job.state, JobState::Cancelled);
    assert!(job.result.is_none());
    assert!(job.partial_artifacts.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_jobs_cancelled_while_entering_stage_when_engine_starts_then_reported_as_requested() {
    let engine = GatedTranscriptionEngine::new();
    let pipeline = PipelineBuilder::new()
        .transcription(engine.clone())
        .transcription_slots(16)
        .build();

    let mut requested = 0;
    for _ in 0..16 {
        let job_id = submit(&pipeline, request(None, false)).await;
        match pipeline.orchestrator.cancel(job_id).await.unwrap() {
            CancelOutcome::CancelRequested(Stage::Transcription) => requested += 1,
            CancelOutcome::Cancelled => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(
        engine.started() <= requested,
        "{} engine calls started but only {} cancels reported a running stage",
        engine.started(),
        requested
    );
    engine.open(16);
}

#[tokio::test]
async fn given_queue_wait_longer_than_retention_when_slot_frees_then_queued_job_completes() {
    let engine = GatedTranscriptionEngine::new();
    let pipeline = PipelineBuilder::new()
        .transcription(engine.clone())
        .transcription_slots(1)
        .retention(Duration::from_millis(300))
        .queue_wait(Duration::from_secs(10))
        .build();

    let first = submit(&pipeline, request(None, false)).await;
    wait_until(|| engine.started() == 1).await;
    let second = submit(&pipeline, request(None, false)).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    engine.open(2);

    for id in [first, second] {
        let job = pipeline.wait_terminal(id).await;
        assert_eq!(job.state, JobState::Completed, "job failed: {:?}", job.failure);
    }
    assert_eq!(engine.started(), 2);
}

#[tokio::test]
async fn given_terminal_job_when_cancelled_then_already_terminal() {
    let pipeline = PipelineBuilder::new().build();
    let job_id = submit(&pipeline, request(None, false)).await;
    pipeline.wait_terminal(job_id).await;

    let outcome = pipeline.orchestrator.cancel(job_id).await.unwrap();

    assert_eq!(outcome, CancelOutcome::AlreadyTerminal(JobState::Completed));
}

#[tokio::test]
async fn given_unknown_job_when_cancelled_then_not_found() {
    let pipeline = PipelineBuilder::new().build();

    let err = pipeline.orchestrator.cancel(JobId::new()).await.unwrap_err();

    assert!(matches!(err, OrchestratorError::JobNotFound(_)));
    assert!(pipeline.orchestrator.status(JobId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn given_completed_job_when_finalized_then_record_and_artifacts_removed() {
    let pipeline = PipelineBuilder::new().build();
    let job_id = submit(&pipeline, request(Some("es"), true)).await;
    let job = pipeline.wait_terminal(job_id).await;
    let audio = job.result.unwrap().audio.unwrap();

    let removed = pipeline.orchestrator.finalize(job_id).await.unwrap();

    assert_eq!(removed, 4);
    assert!(pipeline.orchestrator.status(job_id).await.unwrap().is_none());
    assert!(pipeline.store.get(&audio).await.is_err());
    assert_eq!(pipeline.store.usage().used_bytes, 0);
}

#[tokio::test]
async fn given_running_job_when_finalized_then_not_terminal() {
    let engine = GatedTranscriptionEngine::new();
    let pipeline = PipelineBuilder::new().transcription(engine.clone()).build();
    let job_id = submit(&pipeline, request(None, false)).await;
    pipeline.wait_state(job_id, JobState::Transcribing).await;

    let err = pipeline.orchestrator.finalize(job_id).await.unwrap_err();

    assert!(matches!(err, OrchestratorError::NotTerminal(_, JobState::Transcribing)));
    engine.open(1);
    pipeline.wait_terminal(job_id).await;
}

#[tokio::test]
async fn given_completed_job_when_downloading_artifact_then_bytes_returned() {
    let pipeline = PipelineBuilder::new().build();
    let job_id = submit(&pipeline, request(None, false)).await;
    let job = pipeline.wait_terminal(job_id).await;
    let transcript = job.result.unwrap().transcript.unwrap();

    let (artifact, bytes) = pipeline
        .orchestrator
        .artifact_for_download(transcript)
        .await
        .unwrap();

    assert_eq!(artifact.content_type, "text/plain; charset=utf-8");
    assert_eq!(bytes, Bytes::from(ENGLISH_SCRIPT));
}

#[tokio::test]
async fn given_source_artifact_when_downloading_then_not_deliverable() {
    let pipeline = PipelineBuilder::new().build();
    let job_id = submit(&pipeline, request(None, false)).await;
    let job = pipeline.wait_terminal(job_id).await;

    let err = pipeline
        .orchestrator
        .artifact_for_download(job.source.unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::ArtifactNotFound(_)));
}

#[tokio::test]
async fn given_quota_smaller_than_upload_when_submitting_then_job_fails_with_storage_full() {
    let pipeline = PipelineBuilder::new().quota_bytes(1024).build();

    let job_id = submit(&pipeline, request(None, false)).await;
    let job = pipeline.job(job_id).await;

    assert_eq!(job.state, JobState::Failed);
    assert!(job.source.is_none());
    let failure = job.failure.unwrap();
    assert_eq!(failure.code, FailureCode::StorageFull);
    assert_eq!(failure.category, ErrorCategory::ResourceError);
}

#[tokio::test]
async fn given_healthy_engines_when_checking_health_then_reports_every_stage() {
    let pipeline = PipelineBuilder::new().build();

    let report = pipeline.orchestrator.health().await;

    assert!(report.healthy);
    assert_eq!(report.engines.len(), 3);
    assert_eq!(report.stages.len(), 3);
    assert_eq!(report.jobs, 0);
}

#[tokio::test]
async fn given_job_count_unavailable_when_checking_health_then_degraded() {
    let pipeline = PipelineBuilder::new().failing_job_count().build();

    let report = pipeline.orchestrator.health().await;

    assert!(!report.healthy);
    assert!(report.engines.iter().all(|e| e.healthy));
    assert_eq!(report.jobs, 0);
}

#[tokio::test]
async fn given_failing_engine_when_checking_health_then_degraded_with_detail() {
    struct DownEngine;

    #[async_trait]
    impl TranscriptionEngine for DownEngine {
        fn name(&self) -> &str {
            "down"
        }

        async fn transcribe(
            &self,
            _audio_data: &[u8],
            _file_name: &str,
            _options: &TranscriptionOptions,
        ) -> Result<EngineTranscript, TranscriptionError> {
            Err(TranscriptionError::ModelLoadFailed("weights missing".to_string()))
        }

        async fn health_check(&self) -> Result<(), TranscriptionError> {
            Err(TranscriptionError::ModelLoadFailed("weights missing".to_string()))
        }
    }

    let pipeline = PipelineBuilder::new().transcription(Arc::new(DownEngine)).build();

    let report = pipeline.orchestrator.health().await;

    assert!(!report.healthy);
    let transcription = report
        .engines
        .iter()
        .find(|e| e.stage == "transcription")
        .unwrap();
    assert!(!transcription.healthy);
    assert!(transcription.detail.as_deref().unwrap().contains("weights missing"));
}

#[tokio::test]
async fn given_finished_jobs_past_retention_when_expiring_then_removed() {
    let pipeline = PipelineBuilder::new().build();
    let job_id = submit(&pipeline, request(None, false)).await;
    pipeline.wait_terminal(job_id).await;

    assert_eq!(pipeline.orchestrator.expire_jobs(Utc::now()).await.unwrap(), 0);
    let expired = pipeline
        .orchestrator
        .expire_jobs(Utc::now() + chrono::Duration::hours(2))
        .await
        .unwrap();

    assert_eq!(expired, 1);
    assert!(pipeline.orchestrator.status(job_id).await.unwrap().is_none());
    assert_eq!(pipeline.store.usage().artifacts, 0);
}
