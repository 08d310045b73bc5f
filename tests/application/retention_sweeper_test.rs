use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use voxbridge::application::ports::ArtifactStore;
use voxbridge::application::services::{RetentionSweeper, SubmitRequest};
use voxbridge::domain::{JobRequest, JobState, TranscriptionTask};

use crate::helpers::{PipelineBuilder, wav_bytes};

fn submission() -> SubmitRequest {
    SubmitRequest {
        request: JobRequest {
            filename: "note.wav".to_string(),
            source_language: None,
            task: TranscriptionTask::Transcribe,
            target_language: None,
            synthesize: false,
            voice: None,
        },
        data: Bytes::from(wav_bytes(1.0, 16_000)),
        content_type: "audio/wav".to_string(),
    }
}

#[tokio::test]
async fn given_finished_job_past_retention_when_sweeping_then_job_and_artifacts_removed() {
    let pipeline = PipelineBuilder::new().retention(Duration::from_secs(1)).build();
    let job_id = pipeline.orchestrator.submit(submission()).await.unwrap();
    assert_eq!(pipeline.wait_terminal(job_id).await.state, JobState::Completed);
    let sweeper = RetentionSweeper::new(
        pipeline.orchestrator.clone(),
        pipeline.store.clone(),
        Duration::from_secs(60),
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let summary = sweeper.sweep_once().await.unwrap();

    assert_eq!(summary.jobs_expired, 1);
    assert!(pipeline.orchestrator.status(job_id).await.unwrap().is_none());
    assert_eq!(pipeline.store.usage().artifacts, 0);
}

#[tokio::test]
async fn given_fresh_job_when_sweeping_then_nothing_removed() {
    let pipeline = PipelineBuilder::new().build();
    let job_id = pipeline.orchestrator.submit(submission()).await.unwrap();
    pipeline.wait_terminal(job_id).await;
    let sweeper = RetentionSweeper::new(
        pipeline.orchestrator.clone(),
        pipeline.store.clone(),
        Duration::from_secs(60),
    );

    let summary = sweeper.sweep_once().await.unwrap();

    assert_eq!(summary.jobs_expired, 0);
    assert_eq!(summary.artifacts.expired, 0);
    assert!(pipeline.orchestrator.status(job_id).await.unwrap().is_some());
}

#[tokio::test]
async fn given_running_sweeper_when_shutdown_signalled_then_loop_exits() {
    let pipeline = PipelineBuilder::new().build();
    let sweeper = RetentionSweeper::new(
        pipeline.orchestrator.clone(),
        pipeline.store.clone(),
        Duration::from_millis(10),
    );
    let token = CancellationToken::new();
    let handle = tokio::spawn(sweeper.run(token.clone()));

    tokio::time::sleep(Duration::from_millis(30)).await;
    token.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}
