use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    ArtifactStore, ArtifactStoreError, AudioProbe, JobRepository, TranscriptionEngine,
    TranscriptionError,
};
use crate::application::services::{
    PipelineOrchestrator, RetentionSweeper, StagePools, StreamTranscriber, SynthesisAdapter,
    TranscriptionAdapter, TranslationAdapter, VoiceCatalog,
};
use crate::infrastructure::audio::{
    MockTranscriptionEngine, SymphoniaAudioProbe, TranscriptionEngineFactory,
};
use crate::infrastructure::persistence::InMemoryJobRepository;
use crate::infrastructure::storage::LocalArtifactStore;
use crate::infrastructure::synthesis::SynthesisEngineFactory;
use crate::infrastructure::translation::TranslationEngineFactory;
use crate::presentation::config::{ScaffoldConfig, Settings, SettingsError, TranscriptionProvider};
use crate::presentation::state::AppState;

/// Everything `main` needs to serve: the router state and the background sweeper.
pub struct Application {
    pub state: AppState,
    pub sweeper: RetentionSweeper,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("transcription engine: {0}")]
    Transcription(#[from] TranscriptionError),
    #[error("artifact store: {0}")]
    Storage(#[from] ArtifactStoreError),
}

/// Wires engines, adapters, pools and storage into one orchestrator.
pub async fn build_application(
    mut settings: Settings,
    scaffold: &ScaffoldConfig,
) -> Result<Application, BootstrapError> {
    scaffold.apply(&mut settings);
    if scaffold.enabled {
        tracing::warn!("Scaffold mode enabled, all engines are mocks");
    }

    let transcription_languages = settings.transcription_languages()?;
    let translation_policy = settings.translation_policy()?;
    let voices = settings.voices()?;

    let transcription_engine = create_transcription_engine(&settings, scaffold)?;
    let translation_engine = TranslationEngineFactory::create(
        settings.translation.provider,
        settings.translation.base_url.clone(),
        settings.translation.api_key.clone(),
        &transcription_languages,
    );
    let synthesis_engine = SynthesisEngineFactory::create(
        settings.synthesis.provider,
        settings.synthesis.base_url.clone(),
        settings.synthesis.multilingual,
    );

    let store: Arc<dyn ArtifactStore> = Arc::new(LocalArtifactStore::new(settings.store_config())?);
    let jobs: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
    let probe: Arc<dyn AudioProbe> = Arc::new(SymphoniaAudioProbe::new());

    let transcription = Arc::new(TranscriptionAdapter::new(
        transcription_engine,
        Arc::clone(&store),
        Arc::clone(&probe),
        settings.transcription_timeout(),
    ));
    let translation = Arc::new(TranslationAdapter::new(translation_engine, translation_policy));
    translation.initialize().await;
    let synthesis = Arc::new(SynthesisAdapter::new(
        synthesis_engine,
        Arc::clone(&store),
        probe,
        VoiceCatalog::new(voices),
        settings.synthesis_policy(),
    ));

    let pools = Arc::new(StagePools::new(settings.stage_limits(), settings.queue_wait()));
    let stream = Arc::new(StreamTranscriber::new(
        Arc::clone(&store),
        Arc::clone(&transcription),
        Arc::clone(&translation),
        Arc::clone(&pools),
    ));
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        jobs,
        Arc::clone(&store),
        transcription,
        translation,
        synthesis,
        pools,
        settings.retention(),
    ));

    let sweeper = RetentionSweeper::new(
        Arc::clone(&orchestrator),
        store,
        settings.sweep_interval(),
    );

    Ok(Application {
        state: AppState {
            orchestrator,
            stream,
            settings: Arc::new(settings),
            transcription_languages: Arc::new(transcription_languages),
        },
        sweeper,
    })
}

fn create_transcription_engine(
    settings: &Settings,
    scaffold: &ScaffoldConfig,
) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
    let transcription = &settings.transcription;
    if transcription.provider == TranscriptionProvider::Mock && scaffold.mock_response_delay_ms > 0 {
        let delay = Duration::from_millis(scaffold.mock_response_delay_ms);
        return Ok(Arc::new(MockTranscriptionEngine::new().with_delay(delay)));
    }

    TranscriptionEngineFactory::create(
        transcription.provider,
        &transcription.model,
        transcription.api_key.clone(),
        transcription.base_url.clone(),
    )
}
