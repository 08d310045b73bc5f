use std::fmt;
use std::str::FromStr;

use super::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Queued,
    Transcribing,
    Translating,
    Synthesizing,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Transcribing => "transcribing",
            JobState::Translating => "translating",
            JobState::Synthesizing => "synthesizing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    /// The state a job is in while the given stage runs.
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Transcription => JobState::Transcribing,
            Stage::Translation => JobState::Translating,
            Stage::Synthesis => JobState::Synthesizing,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            JobState::Transcribing => Some(Stage::Transcription),
            JobState::Translating => Some(Stage::Translation),
            JobState::Synthesizing => Some(Stage::Synthesis),
            _ => None,
        }
    }

    /// Position along the pipeline; terminal failure states have none.
    fn rank(&self) -> Option<u8> {
        match self {
            JobState::Queued => Some(0),
            JobState::Transcribing => Some(1),
            JobState::Translating => Some(2),
            JobState::Synthesizing => Some(3),
            JobState::Completed => Some(4),
            JobState::Failed | JobState::Cancelled => None,
        }
    }

    /// Forward-only transitions. Translation and synthesis may be skipped,
    /// transcription may not.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(next, JobState::Failed | JobState::Cancelled) {
            return true;
        }
        match (self, next) {
            (JobState::Queued, JobState::Transcribing) => true,
            (JobState::Queued, _) => false,
            _ => match (self.rank(), next.rank()) {
                (Some(current), Some(target)) => target > current,
                _ => false,
            },
        }
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobState::Queued),
            "transcribing" => Ok(JobState::Transcribing),
            "translating" => Ok(JobState::Translating),
            "synthesizing" => Ok(JobState::Synthesizing),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            "cancelled" => Ok(JobState::Cancelled),
            _ => Err(format!("Invalid job state: {}", s)),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
