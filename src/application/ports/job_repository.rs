use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Job, JobId, JobTransition};

use super::RepositoryError;

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    /// Applies the transition atomically and returns the updated job.
    async fn transition(
        &self,
        id: JobId,
        transition: JobTransition,
    ) -> Result<Job, RepositoryError>;

    /// Terminal jobs last updated before the cutoff.
    async fn list_finished_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Job>, RepositoryError>;

    async fn remove(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    async fn count(&self) -> Result<usize, RepositoryError>;
}
