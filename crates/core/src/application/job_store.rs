// Job Store - single source of truth for job state
//
// Every operation takes the lock once and releases it before returning, so
// each operation is atomic; nothing is atomic across operations.

use crate::domain::{DomainError, Job, JobId, JobStatus, JobUpdate, MergeOutcome, SubmittedFile};
use crate::error::{AppError, Result};
use crate::port::TimeProvider;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

struct StoredJob {
    /// Insertion sequence, tie-breaker for equal `started_at`
    seq: u64,
    job: Job,
}

#[derive(Default)]
struct StoreInner {
    jobs: HashMap<JobId, StoredJob>,
    next_seq: u64,
}

/// In-memory job store (process lifetime only)
pub struct JobStore {
    clock: Arc<dyn TimeProvider>,
    inner: RwLock<StoreInner>,
}

impl JobStore {
    pub fn new(clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            clock,
            inner: RwLock::new(StoreInner::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new job with `started_at = now`
    ///
    /// # Errors
    /// - AppError::Conflict if the id already exists
    /// - AppError::Domain if `status` is terminal
    pub fn create(
        &self,
        id: JobId,
        submitted_files: Vec<SubmittedFile>,
        status: JobStatus,
    ) -> Result<Job> {
        let job = Job::new(id, submitted_files, status, self.clock.now_millis())?;

        let mut inner = self.write();
        if inner.jobs.contains_key(&job.id) {
            warn!(job_id = %job.id, "Rejected duplicate job id");
            return Err(AppError::Conflict(
                DomainError::DuplicateJob(job.id.to_string()).to_string(),
            ));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(
            job.id.clone(),
            StoredJob {
                seq,
                job: job.clone(),
            },
        );

        info!(
            job_id = %job.id,
            status = %job.status,
            files = job.submitted_files.len(),
            "Job created"
        );
        Ok(job)
    }

    /// Shallow-merge an update onto a job (see [`Job::apply`] for the rules)
    ///
    /// # Errors
    /// - AppError::NotFound if the id is unknown (nothing is changed)
    pub fn merge_status(&self, id: &JobId, update: JobUpdate) -> Result<MergeOutcome> {
        let now = self.clock.now_millis();
        let mut inner = self.write();
        let Some(entry) = inner.jobs.get_mut(id) else {
            warn!(job_id = %id, "Merge for unknown job ignored");
            return Err(AppError::NotFound(
                DomainError::JobNotFound(id.to_string()).to_string(),
            ));
        };

        let outcome = entry.job.apply(update, now);

        if outcome.rejected_status {
            debug!(
                job_id = %id,
                current = %outcome.current,
                "Ignored status regression"
            );
        }
        if outcome.rejected_shrink {
            warn!(job_id = %id, "Ignored result set smaller than the current one");
        }
        if outcome.truncated_results {
            warn!(
                job_id = %id,
                expected = entry.job.submitted_files.len(),
                "Backend returned more results than submitted files"
            );
        }
        if outcome.became_terminal {
            info!(
                job_id = %id,
                status = %outcome.current,
                results = entry.job.results.len(),
                "Job reached terminal status"
            );
        }

        Ok(outcome)
    }

    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.read().jobs.get(id).map(|entry| entry.job.clone())
    }

    /// Jobs in canonical dashboard order: ascending `started_at`, ties by insertion
    pub fn list_sorted_by_submission(&self) -> Vec<Job> {
        let inner = self.read();
        let mut entries: Vec<&StoredJob> = inner.jobs.values().collect();
        entries.sort_by_key(|entry| (entry.job.started_at, entry.seq));
        entries.into_iter().map(|entry| entry.job.clone()).collect()
    }

    /// Zero-based dashboard position of a job
    pub fn position(&self, id: &JobId) -> Option<usize> {
        self.list_sorted_by_submission()
            .iter()
            .position(|job| &job.id == id)
    }

    /// Non-terminal, server-tracked jobs in dashboard order
    pub fn pollable_active_ids(&self) -> Vec<JobId> {
        self.list_sorted_by_submission()
            .into_iter()
            .filter(|job| job.id.is_pollable() && job.status.is_active())
            .map(|job| job.id)
            .collect()
    }

    pub fn has_pollable_active(&self) -> bool {
        self.read()
            .jobs
            .values()
            .any(|entry| entry.job.id.is_pollable() && entry.job.status.is_active())
    }

    /// Any non-terminal job, polled or not
    pub fn has_active(&self) -> bool {
        self.read()
            .jobs
            .values()
            .any(|entry| entry.job.status.is_active())
    }

    pub fn len(&self) -> usize {
        self.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
