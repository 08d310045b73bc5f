use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{
    ArtifactStore, ArtifactStoreError, JobRepository, RepositoryError, StorageUsage,
};
use crate::domain::{
    Artifact, ArtifactId, ArtifactKind, FailureCode, Job, JobFailure, JobId, JobRequest,
    JobResult, JobState, JobTransition, LanguageCode, Stage, SynthesisOptions,
    TranscriptionOptions, TranscriptionTask, VoiceSelection,
};

use super::{
    AcquireError, StageError, StageMetrics, StagePermit, StagePools, SynthesisAdapter,
    TranscriptionAdapter, TranslationAdapter,
};

pub struct SubmitRequest {
    pub request: JobRequest,
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Removed before any stage picked it up.
    Cancelled,
    /// The running stage finishes but its output is discarded.
    CancelRequested(Stage),
    AlreadyTerminal(JobState),
}

/// A job together with the metadata of its deliverable artifacts.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub job: Job,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineHealth {
    pub stage: &'static str,
    pub engine: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub engines: Vec<EngineHealth>,
    pub stages: Vec<StageMetrics>,
    pub storage: StorageUsage,
    pub jobs: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("job not found: {0}")]
    JobNotFound(JobId),
    #[error("artifact not found: {0}")]
    ArtifactNotFound(ArtifactId),
    #[error("job {0} is still {1}")]
    NotTerminal(JobId, JobState),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("artifact store: {0}")]
    Store(#[from] ArtifactStoreError),
}

#[derive(Clone)]
struct ActiveJob {
    cancel: CancellationToken,
    running: Arc<Mutex<Option<Stage>>>,
}

impl ActiveJob {
    fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            running: Arc::new(Mutex::new(None)),
        }
    }
}

enum PipelineAbort {
    Failed {
        stage: Option<Stage>,
        error: StageError,
    },
    /// `before_stage` is true when no engine call was in flight.
    Cancelled { before_stage: bool },
}

fn failed(stage: Stage, error: StageError) -> PipelineAbort {
    PipelineAbort::Failed {
        stage: Some(stage),
        error,
    }
}

pub struct PipelineOrchestrator {
    jobs: Arc<dyn JobRepository>,
    store: Arc<dyn ArtifactStore>,
    transcription: Arc<TranscriptionAdapter>,
    translation: Arc<TranslationAdapter>,
    synthesis: Arc<SynthesisAdapter>,
    pools: Arc<StagePools>,
    active: Mutex<HashMap<JobId, ActiveJob>>,
    retention: Duration,
}

impl PipelineOrchestrator {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        store: Arc<dyn ArtifactStore>,
        transcription: Arc<TranscriptionAdapter>,
        translation: Arc<TranslationAdapter>,
        synthesis: Arc<SynthesisAdapter>,
        pools: Arc<StagePools>,
        retention: Duration,
    ) -> Self {
        Self {
            jobs,
            store,
            transcription,
            translation,
            synthesis,
            pools,
            active: Mutex::new(HashMap::new()),
            retention,
        }
    }

    pub fn translation(&self) -> &TranslationAdapter {
        &self.translation
    }

    pub fn synthesis(&self) -> &SynthesisAdapter {
        &self.synthesis
    }

    pub fn pools(&self) -> &StagePools {
        &self.pools
    }

    /// Stores the upload, records the job as `queued` and hands it to a
    /// background task. Never runs an engine on the caller's task.
    pub async fn submit(self: &Arc<Self>, submission: SubmitRequest) -> Result<JobId, OrchestratorError> {
        let job_id = JobId::new();
        self.store.pin(job_id);

        let stored = self
            .store
            .put(
                job_id,
                ArtifactKind::SourceAudio,
                submission.data,
                &submission.content_type,
            )
            .await;

        let (source, storage_failure) = match stored {
            Ok(artifact) => (Some(artifact.id), None),
            Err(e @ ArtifactStoreError::StorageFull { .. }) => {
                tracing::warn!(job_id = %job_id, error = %e, "Upload rejected by storage quota");
                (
                    None,
                    Some(JobFailure::new(FailureCode::StorageFull, None, e.to_string())),
                )
            }
            Err(e) => {
                self.store.unpin(job_id);
                return Err(e.into());
            }
        };

        let job = Job::new(job_id, source, submission.request);
        if let Err(e) = self.jobs.create(&job).await {
            self.store.unpin(job_id);
            if let Err(release_err) = self.store.release_job(job_id).await {
                tracing::warn!(error = %release_err, "Failed to release upload of unrecorded job");
            }
            return Err(e.into());
        }

        if let Some(failure) = storage_failure {
            self.jobs.transition(job_id, JobTransition::Fail(failure)).await?;
            self.store.unpin(job_id);
            return Ok(job_id);
        }

        let handle = ActiveJob::new();
        self.active.lock().insert(job_id, handle.clone());

        let span = tracing::info_span!("pipeline_job", job_id = %job_id);
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_job(job_id, handle).await }.instrument(span));

        tracing::info!(
            job_id = %job_id,
            filename = %job.request.filename,
            target = job.request.target_language.as_ref().map(|l| l.as_str()),
            synthesize = job.request.synthesize,
            "Job queued"
        );

        Ok(job_id)
    }

    pub async fn status(&self, job_id: JobId) -> Result<Option<JobSnapshot>, OrchestratorError> {
        let Some(job) = self.jobs.get_by_id(job_id).await? else {
            return Ok(None);
        };

        let mut artifacts = Vec::new();
        if job.state == JobState::Completed {
            if let Some(result) = &job.result {
                for id in result.artifact_ids() {
                    match self.store.metadata(&id).await {
                        Ok(artifact) => artifacts.push(artifact),
                        Err(ArtifactStoreError::NotFound(_)) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        Ok(Some(JobSnapshot { job, artifacts }))
    }

    /// Partial outputs of a failed or cancelled job.
    pub async fn diagnostics(&self, job_id: JobId) -> Result<Vec<Artifact>, OrchestratorError> {
        let job = self
            .jobs
            .get_by_id(job_id)
            .await?
            .ok_or(OrchestratorError::JobNotFound(job_id))?;

        if !matches!(job.state, JobState::Failed | JobState::Cancelled) {
            return Ok(Vec::new());
        }

        let mut artifacts = Vec::new();
        for id in &job.partial_artifacts {
            match self.store.metadata(id).await {
                Ok(artifact) => artifacts.push(artifact),
                Err(ArtifactStoreError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(artifacts)
    }

    pub async fn cancel(&self, job_id: JobId) -> Result<CancelOutcome, OrchestratorError> {
        let job = self
            .jobs
            .get_by_id(job_id)
            .await?
            .ok_or(OrchestratorError::JobNotFound(job_id))?;
        if job.state.is_terminal() {
            return Ok(CancelOutcome::AlreadyTerminal(job.state));
        }

        let handle = self.active.lock().get(&job_id).cloned();

        match self.jobs.transition(job_id, JobTransition::Cancel).await {
            Ok(_) => {}
            Err(RepositoryError::InvalidTransition(_)) => {
                let state = self
                    .jobs
                    .get_by_id(job_id)
                    .await?
                    .map(|j| j.state)
                    .unwrap_or(JobState::Cancelled);
                return Ok(CancelOutcome::AlreadyTerminal(state));
            }
            Err(e) => return Err(e.into()),
        }

        // Read after the transition: a stage that has not entered by now never will.
        let running = handle.as_ref().and_then(|h| *h.running.lock());
        if let Some(handle) = handle {
            handle.cancel.cancel();
        }

        let outcome = match running {
            Some(stage) => CancelOutcome::CancelRequested(stage),
            None => CancelOutcome::Cancelled,
        };
        tracing::info!(job_id = %job_id, outcome = ?outcome, "Job cancelled");
        Ok(outcome)
    }

    /// Drops a terminal job and every artifact it owns.
    pub async fn finalize(&self, job_id: JobId) -> Result<usize, OrchestratorError> {
        let job = self
            .jobs
            .get_by_id(job_id)
            .await?
            .ok_or(OrchestratorError::JobNotFound(job_id))?;
        if !job.state.is_terminal() {
            return Err(OrchestratorError::NotTerminal(job_id, job.state));
        }

        self.jobs.remove(job_id).await?;
        let removed = self.store.release_job(job_id).await?;
        tracing::info!(job_id = %job_id, artifacts = removed, "Job finalized");
        Ok(removed)
    }

    /// Bytes of a deliverable artifact. Artifacts of jobs that did not
    /// complete are never handed out.
    pub async fn artifact_for_download(
        &self,
        artifact_id: ArtifactId,
    ) -> Result<(Artifact, Bytes), OrchestratorError> {
        let not_found = || OrchestratorError::ArtifactNotFound(artifact_id);

        let artifact = match self.store.metadata(&artifact_id).await {
            Ok(a) => a,
            Err(ArtifactStoreError::NotFound(_)) => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let job = self.jobs.get_by_id(artifact.owner).await?.ok_or_else(not_found)?;

        let deliverable = job.state == JobState::Completed
            && job
                .result
                .as_ref()
                .is_some_and(|r| r.artifact_ids().contains(&artifact_id));
        if !deliverable {
            return Err(not_found());
        }

        match self.store.get(&artifact_id).await {
            Ok(bytes) => Ok((artifact, bytes)),
            Err(ArtifactStoreError::NotFound(_)) => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes terminal jobs whose last update is older than the retention window.
    pub async fn expire_jobs(&self, now: DateTime<Utc>) -> Result<usize, OrchestratorError> {
        let retention = chrono::Duration::from_std(self.retention)
            .unwrap_or_else(|_| chrono::Duration::days(1));
        let expired = self.jobs.list_finished_before(now - retention).await?;

        for job in &expired {
            self.jobs.remove(job.id).await?;
            self.store.release_job(job.id).await?;
            tracing::debug!(job_id = %job.id, state = %job.state, "Expired job removed");
        }
        Ok(expired.len())
    }

    pub async fn health(&self) -> HealthReport {
        let (transcription, translation, synthesis) = tokio::join!(
            self.transcription.health_check(),
            self.translation.health_check(),
            self.synthesis.health_check(),
        );

        let engines = vec![
            engine_health(
                Stage::Transcription,
                self.transcription.engine_name(),
                transcription,
            ),
            engine_health(Stage::Translation, self.translation.engine_name(), translation),
            engine_health(Stage::Synthesis, self.synthesis.engine_name(), synthesis),
        ];

        let mut healthy = engines.iter().all(|e| e.healthy);
        let jobs = match self.jobs.count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to count jobs");
                healthy = false;
                0
            }
        };

        HealthReport {
            healthy,
            engines,
            stages: self.pools.all_metrics(),
            storage: self.store.usage(),
            jobs,
        }
    }

    async fn run_job(self: Arc<Self>, job_id: JobId, handle: ActiveJob) {
        match self.execute(job_id, &handle).await {
            Ok(result) => self.complete(job_id, result).await,
            Err(PipelineAbort::Failed { stage, error }) => self.fail(job_id, stage, error).await,
            Err(PipelineAbort::Cancelled { before_stage }) => {
                if before_stage {
                    match self.store.release_job(job_id).await {
                        Ok(removed) => tracing::info!(
                            artifacts = removed,
                            "Job cancelled before running, artifacts removed"
                        ),
                        Err(e) => tracing::warn!(error = %e, "Failed to release cancelled job"),
                    }
                } else {
                    tracing::info!("Job cancelled mid-stage, output discarded");
                }
            }
        }

        self.store.unpin(job_id);
        self.active.lock().remove(&job_id);
    }

    async fn execute(&self, job_id: JobId, handle: &ActiveJob) -> Result<JobResult, PipelineAbort> {
        let job = self
            .jobs
            .get_by_id(job_id)
            .await
            .map_err(|e| internal(None, e))?
            .ok_or_else(|| internal(None, "job record vanished"))?;
        let request = job.request;

        let source_id = job
            .source
            .ok_or_else(|| internal(Some(Stage::Transcription), "job has no source audio"))?;
        let source = self
            .store
            .metadata(&source_id)
            .await
            .map_err(|e| failed(Stage::Transcription, e.into()))?;

        let options = TranscriptionOptions {
            language: request.source_language.clone(),
            task: request.task,
        };
        let permit = self.enter_stage(job_id, Stage::Transcription, handle).await?;
        let outcome = self.transcription.transcribe(&source, &options).await;
        self.leave_stage(handle, permit);
        let transcript = outcome.map_err(|e| failed(Stage::Transcription, e))?;
        ensure_active(handle)?;

        let transcript_text = transcript.text();
        tracing::debug!(segments = transcript.segments.len(), "Transcript ready");
        let transcript_artifact = self
            .store_text(job_id, ArtifactKind::Transcript, &transcript_text, Stage::Transcription)
            .await?;

        let text_language = match request.task {
            TranscriptionTask::TranslateToEnglish => LanguageCode::parse("en").ok(),
            TranscriptionTask::Transcribe => request
                .source_language
                .clone()
                .or_else(|| transcript.language.clone()),
        };

        let mut final_text = transcript_text;
        let mut final_language = text_language.clone();
        let mut translation_artifact = None;

        if let Some(target) = &request.target_language {
            match &text_language {
                Some(source_lang) if source_lang == target => {
                    tracing::debug!(language = %target, "Source and target match, translation skipped");
                }
                Some(source_lang) => {
                    let permit = self.enter_stage(job_id, Stage::Translation, handle).await?;
                    let outcome = self
                        .translation
                        .translate(&final_text, source_lang, target)
                        .await;
                    self.leave_stage(handle, permit);
                    let translation = outcome.map_err(|e| failed(Stage::Translation, e))?;
                    ensure_active(handle)?;

                    let artifact = self
                        .store_text(
                            job_id,
                            ArtifactKind::Translation,
                            &translation.translated_text,
                            Stage::Translation,
                        )
                        .await?;
                    translation_artifact = Some(artifact);
                    final_text = translation.translated_text;
                    final_language = Some(target.clone());
                }
                None => {
                    return Err(failed(
                        Stage::Translation,
                        StageError::UnsupportedLanguagePair {
                            source_language: "unknown".to_string(),
                            target_language: target.to_string(),
                        },
                    ));
                }
            }
        }

        let mut audio_artifact = None;
        if request.synthesize {
            let selection = match (&request.voice, &final_language) {
                (Some(voice), _) => VoiceSelection::Voice(voice.clone()),
                (None, Some(language)) => VoiceSelection::Language(language.clone()),
                (None, None) => {
                    return Err(failed(
                        Stage::Synthesis,
                        StageError::UnsupportedVoice(
                            "no voice requested and language unknown".to_string(),
                        ),
                    ));
                }
            };

            let permit = self.enter_stage(job_id, Stage::Synthesis, handle).await?;
            let outcome = self
                .synthesis
                .synthesize(job_id, &final_text, &selection, &SynthesisOptions::default())
                .await;
            self.leave_stage(handle, permit);
            let synthesis = outcome.map_err(|e| failed(Stage::Synthesis, e))?;
            ensure_active(handle)?;

            self.record_produced(job_id, synthesis.artifact).await?;
            audio_artifact = Some(synthesis.artifact);
        }

        Ok(JobResult {
            transcript: Some(transcript_artifact),
            translation: translation_artifact,
            audio: audio_artifact,
            detected_language: transcript.language,
            segments: transcript.segments,
        })
    }

    async fn enter_stage(
        &self,
        job_id: JobId,
        stage: Stage,
        handle: &ActiveJob,
    ) -> Result<StagePermit, PipelineAbort> {
        let permit = self
            .pools
            .acquire(stage, &handle.cancel)
            .await
            .map_err(|e| match e {
                AcquireError::Cancelled => PipelineAbort::Cancelled { before_stage: true },
                AcquireError::QueueTimeout { stage, waited } => {
                    failed(stage, StageError::QueueTimeout { stage, waited })
                }
                AcquireError::Closed(stage) => internal(Some(stage), e),
            })?;

        *handle.running.lock() = Some(stage);
        let next = JobState::for_stage(stage);
        match self.jobs.transition(job_id, JobTransition::Enter(next)).await {
            Ok(_) => {
                tracing::debug!(stage = %stage, state = %next, "Stage started");
                Ok(permit)
            }
            Err(RepositoryError::InvalidTransition(e)) => {
                *handle.running.lock() = None;
                tracing::debug!(stage = %stage, reason = %e, "Stage not entered");
                Err(PipelineAbort::Cancelled { before_stage: true })
            }
            Err(e) => {
                *handle.running.lock() = None;
                Err(internal(Some(stage), e))
            }
        }
    }

    fn leave_stage(&self, handle: &ActiveJob, permit: StagePermit) {
        let stage = permit.stage();
        drop(permit);
        *handle.running.lock() = None;
        tracing::debug!(stage = %stage, "Stage finished");
    }

    async fn store_text(
        &self,
        job_id: JobId,
        kind: ArtifactKind,
        text: &str,
        stage: Stage,
    ) -> Result<ArtifactId, PipelineAbort> {
        let artifact = self
            .store
            .put(
                job_id,
                kind,
                Bytes::from(text.to_string()),
                "text/plain; charset=utf-8",
            )
            .await
            .map_err(|e| failed(stage, e.into()))?;
        self.record_produced(job_id, artifact.id).await?;
        Ok(artifact.id)
    }

    async fn record_produced(&self, job_id: JobId, artifact: ArtifactId) -> Result<(), PipelineAbort> {
        match self
            .jobs
            .transition(job_id, JobTransition::Produced(artifact))
            .await
        {
            Ok(_) => Ok(()),
            Err(RepositoryError::InvalidTransition(_)) => {
                Err(PipelineAbort::Cancelled { before_stage: false })
            }
            Err(e) => Err(internal(None, e)),
        }
    }

    async fn complete(&self, job_id: JobId, result: JobResult) {
        for id in result.artifact_ids() {
            if let Err(e) = self.store.promote(&id).await {
                self.fail(job_id, None, StageError::Internal(format!("promote {}: {}", id, e)))
                    .await;
                return;
            }
        }

        let produced = result.artifact_ids().len();
        match self
            .jobs
            .transition(job_id, JobTransition::Complete(result))
            .await
        {
            Ok(_) => tracing::info!(artifacts = produced, "Job completed"),
            Err(RepositoryError::InvalidTransition(e)) => {
                tracing::info!(reason = %e, "Job finished after cancellation, result discarded")
            }
            Err(e) => tracing::error!(error = %e, "Failed to record job completion"),
        }
    }

    async fn fail(&self, job_id: JobId, stage: Option<Stage>, error: StageError) {
        let failure = error.to_failure(stage);
        match failure.code {
            FailureCode::Internal => {
                tracing::error!(stage = ?stage, error = %error, "Job failed with internal error")
            }
            code => tracing::warn!(
                stage = ?stage,
                code = %code,
                category = %failure.category,
                error = %error,
                "Job failed"
            ),
        }

        match self.jobs.transition(job_id, JobTransition::Fail(failure)).await {
            Ok(_) => {}
            Err(RepositoryError::InvalidTransition(e)) => {
                tracing::debug!(reason = %e, "Failure not recorded, job already terminal")
            }
            Err(e) => tracing::error!(error = %e, "Failed to record job failure"),
        }
    }
}

fn ensure_active(handle: &ActiveJob) -> Result<(), PipelineAbort> {
    if handle.cancel.is_cancelled() {
        return Err(PipelineAbort::Cancelled { before_stage: false });
    }
    Ok(())
}

fn internal(stage: Option<Stage>, detail: impl std::fmt::Display) -> PipelineAbort {
    PipelineAbort::Failed {
        stage,
        error: StageError::Internal(detail.to_string()),
    }
}

fn engine_health(stage: Stage, engine: &str, outcome: Result<(), String>) -> EngineHealth {
    EngineHealth {
        stage: stage.as_str(),
        engine: engine.to_string(),
        healthy: outcome.is_ok(),
        detail: outcome.err(),
    }
}
