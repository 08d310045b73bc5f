mod artifacts;
mod error_response;
mod health;
mod jobs;
mod languages;
mod stream;
mod transcribe;

pub use artifacts::artifact_download_handler;
pub use error_response::ErrorResponse;
pub use health::health_handler;
pub use jobs::{delete_job_handler, job_diagnostics_handler, job_status_handler};
pub use languages::supported_languages_handler;
pub use stream::{END_OF_STREAM, StreamMessage, StreamParams, stream_transcribe_handler};
pub use transcribe::{SUPPORTED_EXTENSIONS, sanitize_filename, transcribe_handler};
