mod environment;
mod scaffold_config;
mod settings;

pub use environment::Environment;
pub use scaffold_config::ScaffoldConfig;
pub use settings::{
    LanguageSettings, LoggingSettings, PipelineSettings, ServerSettings, Settings, SettingsError,
    StorageSettings, SynthesisProvider, SynthesisSettings, TranscriptionProvider,
    TranscriptionSettings, TranslationProvider, TranslationSettings, VoiceSettings,
};
