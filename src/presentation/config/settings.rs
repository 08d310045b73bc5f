use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::application::services::{StageLimits, SynthesisPolicy, TranslationPolicy};
use crate::domain::{LanguageCode, LanguageCodeError, LanguagePair, Voice};
use crate::infrastructure::storage::LocalArtifactStoreConfig;

use super::Environment;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub pipeline: PipelineSettings,
    pub storage: StorageSettings,
    pub transcription: TranscriptionSettings,
    pub translation: TranslationSettings,
    pub synthesis: SynthesisSettings,
    pub languages: LanguageSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub transcription_concurrency: usize,
    pub translation_concurrency: usize,
    pub synthesis_concurrency: usize,
    /// Zero means a job takes a free slot immediately or fails.
    pub queue_wait_timeout_ms: u64,
    pub transcription_timeout_secs: u64,
    pub translation_timeout_secs: u64,
    pub synthesis_timeout_secs: u64,
    /// Seconds of audio per chunk on `/stream-transcribe`.
    pub stream_chunk_secs: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            transcription_concurrency: 1,
            translation_concurrency: 2,
            synthesis_concurrency: 1,
            queue_wait_timeout_ms: 300_000,
            transcription_timeout_secs: 600,
            translation_timeout_secs: 120,
            synthesis_timeout_secs: 300,
            stream_chunk_secs: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub root: String,
    pub temp_dir: String,
    pub output_dir: String,
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
    pub quota_mb: u64,
    pub max_upload_mb: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: "data".to_string(),
            temp_dir: "temp".to_string(),
            output_dir: "audio_output".to_string(),
            retention_secs: 24 * 60 * 60,
            sweep_interval_secs: 60 * 60,
            quota_mb: 2048,
            max_upload_mb: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProvider {
    Local,
    #[serde(rename = "openai")]
    OpenAi,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProvider,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProvider::OpenAi,
            base_url: None,
            api_key: None,
            model: "whisper-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    LibreTranslate,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub provider: TranslationProvider,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Empty disables pivoting.
    pub pivot_language: String,
    pub max_text_chars: usize,
    pub load_retries: u32,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::LibreTranslate,
            base_url: "http://localhost:5000".to_string(),
            api_key: None,
            pivot_language: "en".to_string(),
            max_text_chars: 5000,
            load_retries: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisProvider {
    Coqui,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    pub provider: SynthesisProvider,
    pub base_url: String,
    /// Send `language_id` with each request, for multilingual models.
    pub multilingual: bool,
    pub max_text_chars: usize,
    pub min_chars_per_second: f64,
    pub max_chars_per_second: f64,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            provider: SynthesisProvider::Coqui,
            base_url: "http://localhost:5002".to_string(),
            multilingual: false,
            max_text_chars: 1000,
            min_chars_per_second: 2.0,
            max_chars_per_second: 40.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceSettings {
    pub id: String,
    pub language: String,
    #[serde(default)]
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LanguageSettings {
    pub transcription: Vec<String>,
    /// `"en-es"` entries. Empty allows every pair the engine can route.
    pub translation_pairs: Vec<String>,
    /// The first voice listed for a language is its default.
    pub voices: Vec<VoiceSettings>,
}

const DEFAULT_LANGUAGES: [&str; 20] = [
    "en", "es", "fr", "de", "it", "pt", "ru", "ja", "ko", "zh", "ar", "hi", "fi", "sv", "no",
    "da", "nl", "pl", "cs", "sk",
];

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            transcription: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            translation_pairs: Vec::new(),
            voices: DEFAULT_LANGUAGES
                .iter()
                .map(|l| VoiceSettings {
                    id: format!("{}-default", l),
                    language: l.to_string(),
                    speaker: None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid language in {field}: {source}")]
    Language {
        field: &'static str,
        #[source]
        source: LanguageCodeError,
    },
}

fn language_error(field: &'static str) -> impl Fn(LanguageCodeError) -> SettingsError {
    move |source| SettingsError::Language { field, source }
}

impl Settings {
    /// `appsettings.{environment}` (optional) overlaid with `APP_` variables,
    /// e.g. `APP_PIPELINE__TRANSCRIPTION_CONCURRENCY=2`.
    pub fn load(environment: Environment) -> Result<Self, SettingsError> {
        let configuration = Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str().to_lowercase()))
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(" ")
                    .with_list_parse_key("languages.transcription")
                    .with_list_parse_key("languages.translation_pairs")
                    .try_parsing(true),
            )
            .build()?;

        Ok(configuration.try_deserialize()?)
    }

    pub fn stage_limits(&self) -> StageLimits {
        StageLimits {
            transcription: self.pipeline.transcription_concurrency,
            translation: self.pipeline.translation_concurrency,
            synthesis: self.pipeline.synthesis_concurrency,
        }
    }

    pub fn queue_wait(&self) -> Duration {
        Duration::from_millis(self.pipeline.queue_wait_timeout_ms)
    }

    pub fn stream_chunk_secs(&self) -> f64 {
        if self.pipeline.stream_chunk_secs > 0.0 {
            self.pipeline.stream_chunk_secs
        } else {
            2.0
        }
    }

    pub fn transcription_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.transcription_timeout_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.storage.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.storage.sweep_interval_secs.max(1))
    }

    pub fn max_upload_bytes(&self) -> usize {
        (self.storage.max_upload_mb * MIB) as usize
    }

    pub fn store_config(&self) -> LocalArtifactStoreConfig {
        LocalArtifactStoreConfig {
            root: self.storage.root.clone().into(),
            temp_dir: self.storage.temp_dir.clone(),
            output_dir: self.storage.output_dir.clone(),
            retention: self.retention(),
            quota_bytes: self.storage.quota_mb * MIB,
        }
    }

    pub fn transcription_languages(&self) -> Result<Vec<LanguageCode>, SettingsError> {
        self.languages
            .transcription
            .iter()
            .map(|l| LanguageCode::parse(l).map_err(language_error("languages.transcription")))
            .collect()
    }

    pub fn translation_policy(&self) -> Result<TranslationPolicy, SettingsError> {
        let allowed_pairs = self
            .languages
            .translation_pairs
            .iter()
            .map(|p| LanguagePair::parse(p).map_err(language_error("languages.translation_pairs")))
            .collect::<Result<Vec<_>, _>>()?;

        let pivot = match self.translation.pivot_language.trim() {
            "" => None,
            raw => Some(LanguageCode::parse(raw).map_err(language_error("translation.pivot_language"))?),
        };

        Ok(TranslationPolicy {
            allowed_pairs,
            pivot,
            max_text_chars: self.translation.max_text_chars,
            load_retries: self.translation.load_retries,
            timeout: Duration::from_secs(self.pipeline.translation_timeout_secs),
        })
    }

    pub fn synthesis_policy(&self) -> SynthesisPolicy {
        SynthesisPolicy {
            max_text_chars: self.synthesis.max_text_chars,
            min_chars_per_second: self.synthesis.min_chars_per_second,
            max_chars_per_second: self.synthesis.max_chars_per_second,
            timeout: Duration::from_secs(self.pipeline.synthesis_timeout_secs),
        }
    }

    pub fn voices(&self) -> Result<Vec<Voice>, SettingsError> {
        self.languages
            .voices
            .iter()
            .map(|v| -> Result<Voice, SettingsError> {
                Ok(Voice {
                    id: v.id.clone(),
                    language: LanguageCode::parse(&v.language)
                        .map_err(language_error("languages.voices"))?,
                    speaker: v.speaker.clone().filter(|s| !s.is_empty()),
                })
            })
            .collect()
    }
}
