use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use parking_lot::{Mutex, RwLock};

use crate::application::ports::{ArtifactStore, ArtifactStoreError, StorageUsage, SweepReport};
use crate::domain::{Artifact, ArtifactId, ArtifactKind, JobId, StoragePath, StorageTier};

#[derive(Debug, Clone)]
pub struct LocalArtifactStoreConfig {
    pub root: PathBuf,
    pub temp_dir: String,
    pub output_dir: String,
    pub retention: Duration,
    pub quota_bytes: u64,
}

#[derive(Default)]
struct Index {
    artifacts: HashMap<ArtifactId, Artifact>,
    /// Live artifact bytes plus reservations for in-flight writes.
    used_bytes: u64,
}

/// Artifact store over two directories of one local filesystem root.
pub struct LocalArtifactStore {
    fs: Arc<LocalFileSystem>,
    config: LocalArtifactStoreConfig,
    retention: chrono::Duration,
    index: RwLock<Index>,
    pinned: Mutex<HashSet<JobId>>,
}

impl LocalArtifactStore {
    pub fn new(config: LocalArtifactStoreConfig) -> Result<Self, ArtifactStoreError> {
        for dir in [&config.temp_dir, &config.output_dir] {
            std::fs::create_dir_all(config.root.join(dir))?;
        }
        let fs = LocalFileSystem::new_with_prefix(&config.root)
            .map_err(|e| ArtifactStoreError::UploadFailed(e.to_string()))?;
        let retention = chrono::Duration::from_std(config.retention)
            .map_err(|e| ArtifactStoreError::UploadFailed(format!("retention: {}", e)))?;

        tracing::info!(
            root = %config.root.display(),
            temp_dir = %config.temp_dir,
            output_dir = %config.output_dir,
            quota_bytes = config.quota_bytes,
            "Artifact store ready"
        );

        Ok(Self {
            fs: Arc::new(fs),
            config,
            retention,
            index: RwLock::new(Index::default()),
            pinned: Mutex::new(HashSet::new()),
        })
    }

    fn lookup(&self, id: &ArtifactId) -> Result<Artifact, ArtifactStoreError> {
        self.index
            .read()
            .artifacts
            .get(id)
            .cloned()
            .ok_or_else(|| ArtifactStoreError::NotFound(id.to_string()))
    }

    fn reserve(&self, size: u64) -> Result<(), ArtifactStoreError> {
        let mut index = self.index.write();
        let available = self.config.quota_bytes.saturating_sub(index.used_bytes);
        if size > available {
            return Err(ArtifactStoreError::StorageFull {
                requested: size,
                available,
            });
        }
        index.used_bytes += size;
        Ok(())
    }

    fn release_reservation(&self, size: u64) {
        let mut index = self.index.write();
        index.used_bytes = index.used_bytes.saturating_sub(size);
    }

    async fn remove_file(&self, path: &StoragePath) -> Result<(), ArtifactStoreError> {
        match self.fs.delete(&ObjectPath::from(path.as_str())).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(ArtifactStoreError::DeleteFailed(e.to_string())),
        }
    }

    async fn sweep_orphans(
        &self,
        now: DateTime<Utc>,
        report: &mut SweepReport,
    ) -> Result<(), ArtifactStoreError> {
        let known: HashSet<String> = self
            .index
            .read()
            .artifacts
            .values()
            .map(|a| a.path.as_str().to_string())
            .collect();
        let cutoff = now - self.retention;

        for dir in [&self.config.temp_dir, &self.config.output_dir] {
            let prefix = ObjectPath::from(dir.as_str());
            let files: Vec<_> = self
                .fs
                .list(Some(&prefix))
                .try_collect()
                .await
                .map_err(|e| ArtifactStoreError::DeleteFailed(format!("list {}: {}", dir, e)))?;

            for meta in files {
                if known.contains(meta.location.as_ref()) || meta.last_modified >= cutoff {
                    continue;
                }
                self.remove_file(&StoragePath::from_raw(meta.location.to_string()))
                    .await?;
                report.orphans += 1;
                report.bytes_freed += meta.size as u64;
                tracing::debug!(path = %meta.location, "Orphan file removed");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(
        &self,
        owner: JobId,
        kind: ArtifactKind,
        data: Bytes,
        content_type: &str,
    ) -> Result<Artifact, ArtifactStoreError> {
        let size = data.len() as u64;
        self.reserve(size)?;

        let id = ArtifactId::new();
        let path = StoragePath::new(&self.config.temp_dir, &id, Artifact::extension_for(content_type));

        let written = self
            .fs
            .put(&ObjectPath::from(path.as_str()), PutPayload::from(data))
            .await;
        if let Err(e) = written {
            self.release_reservation(size);
            return Err(ArtifactStoreError::UploadFailed(e.to_string()));
        }

        let created_at = Utc::now();
        let artifact = Artifact {
            id,
            owner,
            kind,
            content_type: content_type.to_string(),
            size_bytes: size,
            path,
            tier: StorageTier::Temporary,
            created_at,
            retention_deadline: created_at + self.retention,
        };
        self.index.write().artifacts.insert(id, artifact.clone());

        tracing::debug!(
            artifact_id = %id,
            job_id = %owner,
            kind = kind.as_str(),
            size_bytes = size,
            "Artifact stored"
        );
        Ok(artifact)
    }

    async fn get(&self, id: &ArtifactId) -> Result<Bytes, ArtifactStoreError> {
        let artifact = self.lookup(id)?;
        // Pinned jobs keep reading their artifacts past the deadline.
        if artifact.is_expired(Utc::now()) && !self.pinned.lock().contains(&artifact.owner) {
            return Err(ArtifactStoreError::NotFound(id.to_string()));
        }

        let result = match self.fs.get(&ObjectPath::from(artifact.path.as_str())).await {
            Ok(r) => r,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(ArtifactStoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(ArtifactStoreError::DownloadFailed(e.to_string())),
        };
        result
            .bytes()
            .await
            .map_err(|e| ArtifactStoreError::DownloadFailed(e.to_string()))
    }

    async fn metadata(&self, id: &ArtifactId) -> Result<Artifact, ArtifactStoreError> {
        self.lookup(id)
    }

    async fn delete(&self, id: &ArtifactId) -> Result<(), ArtifactStoreError> {
        let removed = {
            let mut index = self.index.write();
            let removed = index.artifacts.remove(id);
            if let Some(artifact) = &removed {
                index.used_bytes = index.used_bytes.saturating_sub(artifact.size_bytes);
            }
            removed
        };

        match removed {
            Some(artifact) => self.remove_file(&artifact.path).await,
            None => Ok(()),
        }
    }

    async fn promote(&self, id: &ArtifactId) -> Result<Artifact, ArtifactStoreError> {
        let artifact = self.lookup(id)?;
        if artifact.tier == StorageTier::Output {
            return Ok(artifact);
        }

        let target = artifact.path.relocate(&self.config.output_dir);
        self.fs
            .rename(
                &ObjectPath::from(artifact.path.as_str()),
                &ObjectPath::from(target.as_str()),
            )
            .await
            .map_err(|e| ArtifactStoreError::PromoteFailed(format!("{}: {}", id, e)))?;

        let mut index = self.index.write();
        let entry = index
            .artifacts
            .get_mut(id)
            .ok_or_else(|| ArtifactStoreError::NotFound(id.to_string()))?;
        entry.path = target;
        entry.tier = StorageTier::Output;
        Ok(entry.clone())
    }

    fn pin(&self, owner: JobId) {
        self.pinned.lock().insert(owner);
    }

    fn unpin(&self, owner: JobId) {
        self.pinned.lock().remove(&owner);
    }

    async fn release_job(&self, owner: JobId) -> Result<usize, ArtifactStoreError> {
        let owned: Vec<ArtifactId> = self
            .index
            .read()
            .artifacts
            .values()
            .filter(|a| a.owner == owner)
            .map(|a| a.id)
            .collect();

        for id in &owned {
            self.delete(id).await?;
        }
        Ok(owned.len())
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, ArtifactStoreError> {
        let mut report = SweepReport::default();

        let expired: Vec<Artifact> = {
            let pinned = self.pinned.lock();
            let index = self.index.read();
            let mut expired = Vec::new();
            for artifact in index.artifacts.values().filter(|a| a.is_expired(now)) {
                if pinned.contains(&artifact.owner) {
                    report.skipped_pinned += 1;
                } else {
                    expired.push(artifact.clone());
                }
            }
            expired
        };

        for artifact in expired {
            self.delete(&artifact.id).await?;
            report.expired += 1;
            report.bytes_freed += artifact.size_bytes;
        }

        self.sweep_orphans(now, &mut report).await?;
        Ok(report)
    }

    fn usage(&self) -> StorageUsage {
        let index = self.index.read();
        StorageUsage {
            artifacts: index.artifacts.len(),
            used_bytes: index.used_bytes,
            quota_bytes: self.config.quota_bytes,
        }
    }
}
