use voxbridge::infrastructure::observability::TracingConfig;

#[test]
fn given_explicit_values_when_building_then_kept() {
    let config = TracingConfig::new("production", "warn", true);

    assert_eq!(config.environment, "production");
    assert_eq!(config.level, "warn");
    assert!(config.json_format);
}

#[test]
fn given_level_when_building_directives_then_crate_and_http_included() {
    let config = TracingConfig::new("local", "debug", false);

    assert_eq!(
        config.default_directives(),
        "debug,voxbridge=debug,tower_http=info"
    );
}

#[test]
fn given_default_config_then_local_environment_at_info() {
    let config = TracingConfig::default();

    assert_eq!(config.environment, "local");
    assert_eq!(config.level, "info");
}
