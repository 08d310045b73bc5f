use chrono::{DateTime, Utc};

use super::{
    ArtifactId, JobFailure, JobId, JobState, LanguageCode, TranscriptSegment, TranscriptionTask,
};

/// What the caller asked for when submitting the upload.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub filename: String,
    pub source_language: Option<LanguageCode>,
    pub task: TranscriptionTask,
    pub target_language: Option<LanguageCode>,
    pub synthesize: bool,
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobResult {
    pub transcript: Option<ArtifactId>,
    pub translation: Option<ArtifactId>,
    pub audio: Option<ArtifactId>,
    pub detected_language: Option<LanguageCode>,
    pub segments: Vec<TranscriptSegment>,
}

impl JobResult {
    pub fn artifact_ids(&self) -> Vec<ArtifactId> {
        [self.transcript, self.translation, self.audio]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum JobTransition {
    /// Enter the running state of a stage once its pool slot is held.
    Enter(JobState),
    /// Record an artifact produced by a finished stage.
    Produced(ArtifactId),
    Complete(JobResult),
    Fail(JobFailure),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobTransitionError {
    #[error("illegal transition {from} -> {to}")]
    Illegal { from: JobState, to: JobState },
    #[error("job is already {0}")]
    Terminal(JobState),
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    /// `None` when the upload could not be stored.
    pub source: Option<ArtifactId>,
    pub request: JobRequest,
    pub result: Option<JobResult>,
    pub failure: Option<JobFailure>,
    /// Outputs of completed stages, kept for diagnostics only.
    pub partial_artifacts: Vec<ArtifactId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: JobId, source: Option<ArtifactId>, request: JobRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: JobState::Queued,
            source,
            request,
            result: None,
            failure: None,
            partial_artifacts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, transition: JobTransition) -> Result<(), JobTransitionError> {
        match transition {
            JobTransition::Enter(next) => {
                if next.is_terminal() {
                    return Err(JobTransitionError::Illegal {
                        from: self.state,
                        to: next,
                    });
                }
                self.advance(next)?;
            }
            JobTransition::Produced(artifact) => {
                if self.state.is_terminal() {
                    return Err(JobTransitionError::Terminal(self.state));
                }
                self.partial_artifacts.push(artifact);
            }
            JobTransition::Complete(result) => {
                self.advance(JobState::Completed)?;
                self.partial_artifacts.clear();
                self.result = Some(result);
            }
            JobTransition::Fail(failure) => {
                self.advance(JobState::Failed)?;
                self.failure = Some(failure);
            }
            JobTransition::Cancel => {
                self.advance(JobState::Cancelled)?;
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    fn advance(&mut self, next: JobState) -> Result<(), JobTransitionError> {
        if self.state.is_terminal() {
            return Err(JobTransitionError::Terminal(self.state));
        }
        if !self.state.can_transition_to(next) {
            return Err(JobTransitionError::Illegal {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Every artifact this job references, source included.
    pub fn referenced_artifacts(&self) -> Vec<ArtifactId> {
        let mut ids: Vec<ArtifactId> = self.source.into_iter().collect();
        ids.extend(self.partial_artifacts.iter().copied());
        if let Some(result) = &self.result {
            ids.extend(result.artifact_ids());
        }
        ids
    }
}
