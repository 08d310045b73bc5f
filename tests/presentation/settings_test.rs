use std::time::Duration;

use voxbridge::presentation::Settings;
use voxbridge::presentation::config::SettingsError;

use crate::helpers::lang;

#[test]
fn given_default_settings_then_stage_limits_and_timeouts_derived() {
    let settings = Settings::default();

    let limits = settings.stage_limits();
    assert_eq!(limits.transcription, 1);
    assert_eq!(limits.translation, 2);
    assert_eq!(limits.synthesis, 1);
    assert_eq!(settings.queue_wait(), Duration::from_secs(300));
    assert_eq!(settings.retention(), Duration::from_secs(24 * 60 * 60));
    assert_eq!(settings.max_upload_bytes(), 100 * 1024 * 1024);
}

#[test]
fn given_zero_sweep_interval_when_deriving_then_clamped_to_one_second() {
    let mut settings = Settings::default();
    settings.storage.sweep_interval_secs = 0;

    assert_eq!(settings.sweep_interval(), Duration::from_secs(1));
}

#[test]
fn given_storage_settings_when_building_store_config_then_quota_in_bytes() {
    let mut settings = Settings::default();
    settings.storage.root = "/var/lib/voxbridge".to_string();
    settings.storage.quota_mb = 3;

    let config = settings.store_config();

    assert_eq!(config.root, std::path::PathBuf::from("/var/lib/voxbridge"));
    assert_eq!(config.temp_dir, "temp");
    assert_eq!(config.output_dir, "audio_output");
    assert_eq!(config.quota_bytes, 3 * 1024 * 1024);
}

#[test]
fn given_pairs_and_pivot_when_building_translation_policy_then_parsed() {
    let mut settings = Settings::default();
    settings.languages.translation_pairs = vec!["en-es".to_string(), "fr:en".to_string()];

    let policy = settings.translation_policy().unwrap();

    assert_eq!(policy.allowed_pairs.len(), 2);
    assert_eq!(policy.allowed_pairs[1].to_string(), "fr-en");
    assert_eq!(policy.pivot, Some(lang("en")));
    assert_eq!(policy.max_text_chars, 5000);
}

#[test]
fn given_blank_pivot_when_building_translation_policy_then_pivoting_disabled() {
    let mut settings = Settings::default();
    settings.translation.pivot_language = "  ".to_string();

    assert!(settings.translation_policy().unwrap().pivot.is_none());
}

#[test]
fn given_malformed_pair_when_building_translation_policy_then_field_named() {
    let mut settings = Settings::default();
    settings.languages.translation_pairs = vec!["english-spanish".to_string()];

    let err = settings.translation_policy().unwrap_err();

    match err {
        SettingsError::Language { field, .. } => assert_eq!(field, "languages.translation_pairs"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn given_default_languages_then_every_voice_parses() {
    let settings = Settings::default();

    let voices = settings.voices().unwrap();
    let languages = settings.transcription_languages().unwrap();

    assert_eq!(voices.len(), languages.len());
    assert!(voices.iter().any(|v| v.id == "es-default" && v.language == lang("es")));
    assert!(voices.iter().all(|v| v.speaker.is_none()));
}
