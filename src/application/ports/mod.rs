mod artifact_store;
mod audio_probe;
mod job_repository;
mod repository_error;
mod synthesis_engine;
mod transcription_engine;
mod translation_engine;

pub use artifact_store::{ArtifactStore, ArtifactStoreError, StorageUsage, SweepReport};
pub use audio_probe::{AudioInfo, AudioProbe, AudioProbeError};
pub use job_repository::JobRepository;
pub use repository_error::RepositoryError;
pub use synthesis_engine::{SynthesisEngine, SynthesisError};
pub use transcription_engine::{TranscriptionEngine, TranscriptionError};
pub use translation_engine::{TranslationEngine, TranslationError};
