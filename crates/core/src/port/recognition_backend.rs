// Recognition Backend Port (Interface)
// The remote service that turns documents into per-region text

use crate::domain::{FileResult, JobStatus, JobUpdate};
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Synchronous recognition of one file
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub job_id: String,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub language: String,
}

/// Answer to a synchronous recognition; a job-level error sits in `result.error`
#[derive(Debug, Clone)]
pub struct SyncRecognition {
    pub result: FileResult,
    pub started_at: Option<i64>,
    pub ended_at: Option<i64>,
    pub duration_ms: Option<f64>,
}

/// One entry of an asynchronous batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem {
    Inline {
        filename: String,
        base64: String,
        language: String,
    },
    Url {
        url: String,
        language: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSubmission {
    pub files: Vec<BatchItem>,
}

/// Backend acknowledgement of an asynchronous batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchAccepted {
    pub job_id: String,
    pub status: JobStatus,
    pub message: Option<String>,
}

/// Full, authoritative job state as reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub results: Vec<FileResult>,
    pub started_at: Option<i64>,
    pub ended_at: Option<i64>,
    pub duration_ms: Option<f64>,
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn into_update(self) -> JobUpdate {
        JobUpdate {
            status: Some(self.status),
            results: Some(self.results),
            ended_at: self.ended_at,
            duration_ms: self.duration_ms,
            error: self.error,
            message: None,
        }
    }
}

/// Backend errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Job {0} not found")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Text recorded on a job failed by this error; a rejection carries the
    /// backend's own message
    pub fn reason(&self) -> String {
        match self {
            BackendError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Recognition Backend trait
///
/// Implementations:
/// - HttpRecognitionBackend: REST client (infra-http)
/// - mocks::ScriptedBackend: scripted answers for tests
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Recognize one file and wait for the result
    async fn recognize(&self, request: SyncRequest) -> Result<SyncRecognition, BackendError>;

    /// Submit a batch for background processing
    async fn submit_batch(&self, batch: BatchSubmission) -> Result<BatchAccepted, BackendError>;

    /// Fetch the current snapshot of a server-tracked job
    ///
    /// # Errors
    /// - BackendError::NotFound if the backend does not know the id
    /// - BackendError::Transport if the request never completed
    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot, BackendError>;

    /// Supported languages, code -> autonym
    async fn languages(&self) -> Result<BTreeMap<String, String>, BackendError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend answering from per-operation scripts.
    ///
    /// Status scripts are per job; the last scripted answer repeats.
    #[derive(Default)]
    pub struct ScriptedBackend {
        sync: Mutex<VecDeque<Result<SyncRecognition, BackendError>>>,
        batches: Mutex<VecDeque<Result<BatchAccepted, BackendError>>>,
        statuses: Mutex<HashMap<String, VecDeque<Result<JobSnapshot, BackendError>>>>,
        delays: Mutex<HashMap<String, Duration>>,
        status_calls: Mutex<HashMap<String, usize>>,
        sync_calls: Mutex<usize>,
        batch_calls: Mutex<Vec<BatchSubmission>>,
    }

    impl ScriptedBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_sync(&self, answer: Result<SyncRecognition, BackendError>) {
            self.sync.lock().unwrap().push_back(answer);
        }

        pub fn push_batch(&self, answer: Result<BatchAccepted, BackendError>) {
            self.batches.lock().unwrap().push_back(answer);
        }

        pub fn push_status(&self, job_id: &str, answer: Result<JobSnapshot, BackendError>) {
            self.statuses
                .lock()
                .unwrap()
                .entry(job_id.to_string())
                .or_default()
                .push_back(answer);
        }

        /// Delay every status answer for `job_id`
        pub fn delay_status(&self, job_id: &str, delay: Duration) {
            self.delays
                .lock()
                .unwrap()
                .insert(job_id.to_string(), delay);
        }

        pub fn status_calls(&self, job_id: &str) -> usize {
            self.status_calls
                .lock()
                .unwrap()
                .get(job_id)
                .copied()
                .unwrap_or(0)
        }

        pub fn total_status_calls(&self) -> usize {
            self.status_calls.lock().unwrap().values().sum()
        }

        pub fn sync_calls(&self) -> usize {
            *self.sync_calls.lock().unwrap()
        }

        pub fn submitted_batches(&self) -> Vec<BatchSubmission> {
            self.batch_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecognitionBackend for ScriptedBackend {
        async fn recognize(&self, _request: SyncRequest) -> Result<SyncRecognition, BackendError> {
            *self.sync_calls.lock().unwrap() += 1;
            self.sync
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::Transport("no scripted answer".into())))
        }

        async fn submit_batch(&self, batch: BatchSubmission) -> Result<BatchAccepted, BackendError> {
            self.batch_calls.lock().unwrap().push(batch);
            self.batches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::Transport("no scripted answer".into())))
        }

        async fn job_status(&self, job_id: &str) -> Result<JobSnapshot, BackendError> {
            *self
                .status_calls
                .lock()
                .unwrap()
                .entry(job_id.to_string())
                .or_default() += 1;

            let delay = self.delays.lock().unwrap().get(job_id).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut statuses = self.statuses.lock().unwrap();
            match statuses.get_mut(job_id) {
                Some(queue) if queue.len() > 1 => queue
                    .pop_front()
                    .unwrap_or_else(|| Err(BackendError::NotFound(job_id.to_string()))),
                Some(queue) => queue
                    .front()
                    .cloned()
                    .unwrap_or_else(|| Err(BackendError::NotFound(job_id.to_string()))),
                None => Err(BackendError::NotFound(job_id.to_string())),
            }
        }

        async fn languages(&self) -> Result<BTreeMap<String, String>, BackendError> {
            Ok(BTreeMap::from([
                ("de".to_string(), "Deutsch".to_string()),
                ("en".to_string(), "English".to_string()),
            ]))
        }
    }
}
