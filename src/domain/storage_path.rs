use std::fmt;

use super::ArtifactId;

/// Location of an artifact relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn new(directory: &str, artifact_id: &ArtifactId, extension: &str) -> Self {
        let directory = directory.trim_matches('/');
        Self(format!("{}/{}.{}", directory, artifact_id.as_uuid(), extension))
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Same file name under another directory.
    pub fn relocate(&self, directory: &str) -> Self {
        Self(format!("{}/{}", directory.trim_matches('/'), self.file_name()))
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
