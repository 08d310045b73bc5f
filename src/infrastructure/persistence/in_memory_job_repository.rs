use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{Job, JobId, JobTransition};

/// Process-local job table. Jobs do not survive a restart.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.write();
        if jobs.contains_key(&job.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "job {} already exists",
                job.id
            )));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.read().get(&id).cloned())
    }

    async fn transition(
        &self,
        id: JobId,
        transition: JobTransition,
    ) -> Result<Job, RepositoryError> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let from = job.state;
        job.apply(transition)?;
        if job.state != from {
            tracing::debug!(job_id = %id, from = %from, to = %job.state, "Job state changed");
        }
        Ok(job.clone())
    }

    async fn list_finished_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Job>, RepositoryError> {
        Ok(self
            .jobs
            .read()
            .values()
            .filter(|j| j.state.is_terminal() && j.updated_at < cutoff)
            .cloned()
            .collect())
    }

    async fn remove(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.write().remove(&id))
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.jobs.read().len())
    }
}
