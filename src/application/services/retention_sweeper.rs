use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{ArtifactStore, ArtifactStoreError, SweepReport};

use super::{OrchestratorError, PipelineOrchestrator};

/// Periodically expires finished jobs and deletes artifacts past their deadline.
pub struct RetentionSweeper {
    orchestrator: Arc<PipelineOrchestrator>,
    store: Arc<dyn ArtifactStore>,
    interval: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub jobs_expired: usize,
    pub artifacts: SweepReport,
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("job expiry failed: {0}")]
    Jobs(#[from] OrchestratorError),
    #[error("artifact sweep failed: {0}")]
    Artifacts(#[from] ArtifactStoreError),
}

impl RetentionSweeper {
    pub fn new(
        orchestrator: Arc<PipelineOrchestrator>,
        store: Arc<dyn ArtifactStore>,
        interval: Duration,
    ) -> Self {
        Self {
            orchestrator,
            store,
            interval,
        }
    }

    pub async fn sweep_once(&self) -> Result<SweepSummary, SweepError> {
        let now = Utc::now();
        let jobs_expired = self.orchestrator.expire_jobs(now).await?;
        let artifacts = self.store.sweep(now).await?;
        Ok(SweepSummary {
            jobs_expired,
            artifacts,
        })
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Retention sweeper started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.sweep_once().await {
                Ok(summary) if summary == SweepSummary::default() => {}
                Ok(summary) => tracing::info!(
                    jobs_expired = summary.jobs_expired,
                    expired = summary.artifacts.expired,
                    orphans = summary.artifacts.orphans,
                    skipped_pinned = summary.artifacts.skipped_pinned,
                    bytes_freed = summary.artifacts.bytes_freed,
                    "Retention sweep finished"
                ),
                Err(e) => tracing::error!(error = %e, "Retention sweep failed"),
            }
        }
        tracing::info!("Retention sweeper stopped");
    }
}
