/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub level: String,
    pub json_format: bool,
}

impl TracingConfig {
    pub fn new(environment: impl Into<String>, level: impl Into<String>, json_format: bool) -> Self {
        Self {
            environment: environment.into(),
            level: level.into(),
            json_format,
        }
    }

    /// `LOG_FORMAT=json` forces JSON output regardless of configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
        {
            self.json_format = true;
        }
        self
    }

    pub fn default_directives(&self) -> String {
        format!("{},voxbridge={},tower_http=info", self.level, self.level)
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::new("local", "info", false).with_env_overrides()
    }
}
