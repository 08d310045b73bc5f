mod pipeline_orchestrator;
mod retention_sweeper;
mod stage_error;
mod stage_pools;
mod stream_transcriber;
mod synthesis_adapter;
mod transcription_adapter;
mod translation_adapter;
mod voice_catalog;

pub use pipeline_orchestrator::{
    CancelOutcome, EngineHealth, HealthReport, JobSnapshot, OrchestratorError,
    PipelineOrchestrator, SubmitRequest,
};
pub use retention_sweeper::{RetentionSweeper, SweepError, SweepSummary};
pub use stage_error::StageError;
pub use stage_pools::{AcquireError, StageLimits, StageMetrics, StagePermit, StagePools};
pub use stream_transcriber::{StreamRequest, StreamSession, StreamTranscriber};
pub use synthesis_adapter::{SynthesisAdapter, SynthesisPolicy};
pub use transcription_adapter::{SEGMENT_TOLERANCE_SECS, TranscriptionAdapter, normalize_segments};
pub use translation_adapter::{TranslationAdapter, TranslationPolicy};
pub use voice_catalog::VoiceCatalog;
