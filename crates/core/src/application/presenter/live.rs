// Live elapsed-time values published by the duration tickers

use crate::domain::JobId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared map of the latest ticker value per running job (ms)
#[derive(Debug, Clone, Default)]
pub struct LiveDurations {
    inner: Arc<Mutex<HashMap<JobId, f64>>>,
}

impl LiveDurations {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, f64>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, job_id: &JobId, elapsed_ms: f64) {
        self.lock().insert(job_id.clone(), elapsed_ms);
    }

    pub fn get(&self, job_id: &JobId) -> Option<f64> {
        self.lock().get(job_id).copied()
    }

    pub fn remove(&self, job_id: &JobId) -> Option<f64> {
        self.lock().remove(job_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
