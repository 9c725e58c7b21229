// Submission Service - sync and batch use cases

pub mod batch;
pub mod sync;
pub mod validate;


use crate::application::events::Dispatcher;
use crate::domain::{JobId, JobStatus};
use crate::error::Result;
use crate::port::{IdProvider, RecognitionBackend};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A document read from disk (or anywhere else) into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// One input of a batch submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInput {
    File(LocalFile),
    Url(String),
}

/// Acknowledgement of an accepted batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    pub job_id: JobId,
    pub status: JobStatus,
    pub message: Option<String>,
}

/// Submission Service
pub struct SubmissionService {
    backend: Arc<dyn RecognitionBackend>,
    dispatcher: Arc<Dispatcher>,
    id_provider: Arc<dyn IdProvider>,
}

impl SubmissionService {
    pub fn new(
        backend: Arc<dyn RecognitionBackend>,
        dispatcher: Arc<Dispatcher>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            backend,
            dispatcher,
            id_provider,
        }
    }

    /// Recognize one file and wait for the answer
    pub async fn submit_sync(&self, file: LocalFile, language: &str) -> Result<JobId> {
        sync::execute(
            self.backend.as_ref(),
            self.dispatcher.as_ref(),
            self.id_provider.as_ref(),
            file,
            language,
        )
        .await
    }

    /// Hand a batch to the backend for background processing
    pub async fn submit_batch(&self, inputs: Vec<BatchInput>, language: &str) -> Result<BatchReceipt> {
        batch::execute(self.backend.as_ref(), self.dispatcher.as_ref(), inputs, language).await
    }

    /// Languages the backend supports, code -> display name
    pub async fn languages(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.backend.languages().await?)
    }
}
