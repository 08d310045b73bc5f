use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;

use crate::domain::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLimits {
    pub transcription: usize,
    pub translation: usize,
    pub synthesis: usize,
}

struct StagePool {
    stage: Stage,
    capacity: usize,
    semaphore: Arc<Semaphore>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    released: AtomicU64,
    rejected: AtomicU64,
}

impl StagePool {
    fn new(stage: Stage, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            stage,
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            released: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }
}

/// Held for the duration of one stage invocation.
pub struct StagePermit {
    pool: Arc<StagePool>,
    _permit: OwnedSemaphorePermit,
}

impl StagePermit {
    pub fn stage(&self) -> Stage {
        self.pool.stage
    }
}

impl fmt::Debug for StagePermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagePermit")
            .field("stage", &self.stage())
            .finish()
    }
}

impl Drop for StagePermit {
    fn drop(&mut self) {
        self.pool.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.pool.released.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    #[error("no {stage} slot within {waited:?}")]
    QueueTimeout { stage: Stage, waited: Duration },
    #[error("cancelled while waiting for a slot")]
    Cancelled,
    #[error("{0} pool closed")]
    Closed(Stage),
}

#[derive(Debug, Clone, Serialize)]
pub struct StageMetrics {
    pub stage: &'static str,
    pub capacity: usize,
    pub in_flight: usize,
    pub peak: usize,
    pub released: u64,
    pub rejected: u64,
}

/// One bounded worker pool per stage, sized to the compute behind it.
pub struct StagePools {
    transcription: Arc<StagePool>,
    translation: Arc<StagePool>,
    synthesis: Arc<StagePool>,
    queue_wait: Duration,
}

impl StagePools {
    pub fn new(limits: StageLimits, queue_wait: Duration) -> Self {
        Self {
            transcription: Arc::new(StagePool::new(Stage::Transcription, limits.transcription)),
            translation: Arc::new(StagePool::new(Stage::Translation, limits.translation)),
            synthesis: Arc::new(StagePool::new(Stage::Synthesis, limits.synthesis)),
            queue_wait,
        }
    }

    fn pool(&self, stage: Stage) -> &Arc<StagePool> {
        match stage {
            Stage::Transcription => &self.transcription,
            Stage::Translation => &self.translation,
            Stage::Synthesis => &self.synthesis,
        }
    }

    pub fn queue_wait(&self) -> Duration {
        self.queue_wait
    }

    /// Waits up to the queue-wait timeout for a slot. A zero timeout only
    /// takes a slot that is free right now.
    pub async fn acquire(
        &self,
        stage: Stage,
        cancel: &CancellationToken,
    ) -> Result<StagePermit, AcquireError> {
        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }
        let pool = self.pool(stage);

        let permit = if self.queue_wait.is_zero() {
            match Arc::clone(&pool.semaphore).try_acquire_owned() {
                Ok(permit) => permit,
                Err(TryAcquireError::NoPermits) => {
                    pool.rejected.fetch_add(1, Ordering::Relaxed);
                    return Err(AcquireError::QueueTimeout {
                        stage,
                        waited: Duration::ZERO,
                    });
                }
                Err(TryAcquireError::Closed) => return Err(AcquireError::Closed(stage)),
            }
        } else {
            let wait = tokio::time::timeout(
                self.queue_wait,
                Arc::clone(&pool.semaphore).acquire_owned(),
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(AcquireError::Cancelled),
                result = wait => match result {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_)) => return Err(AcquireError::Closed(stage)),
                    Err(_) => {
                        pool.rejected.fetch_add(1, Ordering::Relaxed);
                        return Err(AcquireError::QueueTimeout {
                            stage,
                            waited: self.queue_wait,
                        });
                    }
                },
            }
        };

        let now = pool.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        pool.peak.fetch_max(now, Ordering::SeqCst);

        Ok(StagePermit {
            pool: Arc::clone(pool),
            _permit: permit,
        })
    }

    pub fn metrics(&self, stage: Stage) -> StageMetrics {
        let pool = self.pool(stage);
        StageMetrics {
            stage: stage.as_str(),
            capacity: pool.capacity,
            in_flight: pool.in_flight.load(Ordering::SeqCst),
            peak: pool.peak.load(Ordering::SeqCst),
            released: pool.released.load(Ordering::Relaxed),
            rejected: pool.rejected.load(Ordering::Relaxed),
        }
    }

    pub fn all_metrics(&self) -> Vec<StageMetrics> {
        Stage::ALL.iter().map(|s| self.metrics(*s)).collect()
    }
}
