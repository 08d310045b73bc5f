use std::sync::Arc;

use crate::application::services::{PipelineOrchestrator, StreamTranscriber};
use crate::domain::LanguageCode;
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub stream: Arc<StreamTranscriber>,
    pub settings: Arc<Settings>,
    pub transcription_languages: Arc<Vec<LanguageCode>>,
}
