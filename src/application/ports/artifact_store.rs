use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Artifact, ArtifactId, ArtifactKind, JobId};

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes into the temporary directory under a fresh unique name.
    async fn put(
        &self,
        owner: JobId,
        kind: ArtifactKind,
        data: Bytes,
        content_type: &str,
    ) -> Result<Artifact, ArtifactStoreError>;

    async fn get(&self, id: &ArtifactId) -> Result<Bytes, ArtifactStoreError>;

    async fn metadata(&self, id: &ArtifactId) -> Result<Artifact, ArtifactStoreError>;

    async fn delete(&self, id: &ArtifactId) -> Result<(), ArtifactStoreError>;

    /// Moves the artifact from the temporary to the output directory by rename.
    async fn promote(&self, id: &ArtifactId) -> Result<Artifact, ArtifactStoreError>;

    /// Artifacts of pinned jobs survive the sweep regardless of deadline.
    fn pin(&self, owner: JobId);

    fn unpin(&self, owner: JobId);

    /// Deletes every artifact owned by the job. Returns how many were removed.
    async fn release_job(&self, owner: JobId) -> Result<usize, ArtifactStoreError>;

    async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, ArtifactStoreError>;

    fn usage(&self) -> StorageUsage;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub orphans: usize,
    pub skipped_pinned: usize,
    pub bytes_freed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    pub artifacts: usize,
    pub used_bytes: u64,
    pub quota_bytes: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactStoreError {
    #[error("storage full: {requested} bytes requested, {available} available")]
    StorageFull { requested: u64, available: u64 },
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("promote failed: {0}")]
    PromoteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
