mod artifact;
mod artifact_id;
mod failure;
mod job;
mod job_id;
mod job_state;
mod language_code;
mod stage;
mod storage_path;
mod stream;
mod synthesis;
mod transcript;
mod translation;

pub use artifact::{Artifact, ArtifactKind, StorageTier};
pub use artifact_id::ArtifactId;
pub use failure::{ErrorCategory, FailureCode, JobFailure};
pub use job::{Job, JobRequest, JobResult, JobTransition, JobTransitionError};
pub use job_id::JobId;
pub use job_state::JobState;
pub use language_code::{LanguageCode, LanguageCodeError, LanguagePair};
pub use stage::Stage;
pub use storage_path::StoragePath;
pub use stream::{PcmBuffer, STREAM_SAMPLE_RATE, StreamChunk};
pub use synthesis::{SynthesisOptions, SynthesisResult, Voice, VoiceSelection};
pub use transcript::{
    EngineTranscript, Transcript, TranscriptSegment, TranscriptionOptions, TranscriptionTask,
};
pub use translation::TranslationResult;
