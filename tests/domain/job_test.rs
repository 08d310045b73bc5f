use voxbridge::domain::{
    ArtifactId, FailureCode, Job, JobFailure, JobId, JobRequest, JobResult, JobState,
    JobTransition, JobTransitionError, Stage, TranscriptionTask,
};

fn request() -> JobRequest {
    JobRequest {
        filename: "clip.wav".to_string(),
        source_language: None,
        task: TranscriptionTask::Transcribe,
        target_language: None,
        synthesize: false,
        voice: None,
    }
}

fn new_job() -> Job {
    Job::new(JobId::new(), Some(ArtifactId::new()), request())
}

#[test]
fn given_new_job_when_created_then_is_queued_without_result() {
    let job = new_job();
    assert_eq!(job.state, JobState::Queued);
    assert!(job.result.is_none());
    assert!(job.failure.is_none());
    assert_eq!(job.created_at, job.updated_at);
}

#[test]
fn given_running_job_when_stage_produces_artifact_then_kept_as_partial() {
    let mut job = new_job();
    let transcript = ArtifactId::new();

    job.apply(JobTransition::Enter(JobState::Transcribing)).unwrap();
    job.apply(JobTransition::Produced(transcript)).unwrap();

    assert_eq!(job.partial_artifacts, vec![transcript]);
}

#[test]
fn given_completed_job_when_checking_artifacts_then_partials_are_cleared() {
    let mut job = new_job();
    let transcript = ArtifactId::new();
    job.apply(JobTransition::Enter(JobState::Transcribing)).unwrap();
    job.apply(JobTransition::Produced(transcript)).unwrap();

    job.apply(JobTransition::Complete(JobResult {
        transcript: Some(transcript),
        ..JobResult::default()
    }))
    .unwrap();

    assert_eq!(job.state, JobState::Completed);
    assert!(job.partial_artifacts.is_empty());
    assert_eq!(job.result.as_ref().unwrap().artifact_ids(), vec![transcript]);
}

#[test]
fn given_queued_job_when_completing_directly_then_rejected() {
    let mut job = new_job();

    let err = job
        .apply(JobTransition::Complete(JobResult::default()))
        .unwrap_err();

    assert_eq!(
        err,
        JobTransitionError::Illegal {
            from: JobState::Queued,
            to: JobState::Completed
        }
    );
    assert_eq!(job.state, JobState::Queued);
}

#[test]
fn given_failed_job_when_applying_any_transition_then_terminal_error() {
    let mut job = new_job();
    job.apply(JobTransition::Fail(JobFailure::new(
        FailureCode::QueueTimeout,
        Some(Stage::Transcription),
        "no slot",
    )))
    .unwrap();

    let err = job.apply(JobTransition::Cancel).unwrap_err();
    assert_eq!(err, JobTransitionError::Terminal(JobState::Failed));

    let err = job.apply(JobTransition::Produced(ArtifactId::new())).unwrap_err();
    assert_eq!(err, JobTransitionError::Terminal(JobState::Failed));
}

#[test]
fn given_enter_with_terminal_state_when_applying_then_rejected() {
    let mut job = new_job();
    assert!(job.apply(JobTransition::Enter(JobState::Completed)).is_err());
    assert!(job.apply(JobTransition::Enter(JobState::Cancelled)).is_err());
}

#[test]
fn given_job_with_outputs_when_listing_references_then_source_is_included() {
    let mut job = new_job();
    let source = job.source.unwrap();
    let transcript = ArtifactId::new();
    job.apply(JobTransition::Enter(JobState::Transcribing)).unwrap();
    job.apply(JobTransition::Produced(transcript)).unwrap();

    let referenced = job.referenced_artifacts();
    assert!(referenced.contains(&source));
    assert!(referenced.contains(&transcript));
}
