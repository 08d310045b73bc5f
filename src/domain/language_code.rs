use std::fmt;
use std::str::FromStr;

/// ISO 639 shaped language code. Only the shape is checked here;
/// whether an engine supports it is decided by the adapters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn parse(raw: &str) -> Result<Self, LanguageCodeError> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(LanguageCodeError::Empty);
        }
        let valid_len = (2..=3).contains(&normalized.len());
        if !valid_len || !normalized.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(LanguageCodeError::Malformed(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LanguageCode {
    type Err = LanguageCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for LanguageCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for LanguageCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LanguageCodeError {
    #[error("language code is required")]
    Empty,
    #[error("language code must be 2 or 3 letters (ISO 639): {0}")]
    Malformed(String),
}

/// A directed translation pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguagePair {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl LanguagePair {
    pub fn new(source: LanguageCode, target: LanguageCode) -> Self {
        Self { source, target }
    }

    /// Parses `"en-es"` / `"en:es"` notation used in configuration.
    pub fn parse(raw: &str) -> Result<Self, LanguageCodeError> {
        let (source, target) = raw
            .split_once(['-', ':'])
            .ok_or_else(|| LanguageCodeError::Malformed(raw.to_string()))?;
        Ok(Self::new(
            LanguageCode::parse(source)?,
            LanguageCode::parse(target)?,
        ))
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}
