// Asynchronous (Batch) Submission Use Case

use crate::application::events::{ClientEvent, Dispatcher};
use crate::application::submission::validate::{
    validate_batch_size, validate_document, validate_language, validate_url,
};
use crate::application::submission::{BatchInput, BatchReceipt};
use crate::domain::{JobId, JobStatus, SubmittedFile};
use crate::error::{AppError, Result};
use crate::port::{BackendError, BatchItem, BatchSubmission, RecognitionBackend};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{info, warn};

/// Execute a batch submission
///
/// Nothing is stored unless the backend accepts the batch; the job then
/// lives under the backend-assigned id and is picked up by the heartbeat.
pub async fn execute(
    backend: &dyn RecognitionBackend,
    dispatcher: &Dispatcher,
    inputs: Vec<BatchInput>,
    language: &str,
) -> Result<BatchReceipt> {
    validate_batch_size(inputs.len())?;
    validate_language(language)?;

    let mut items = Vec::with_capacity(inputs.len());
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        match input {
            BatchInput::File(file) => {
                validate_document(&file.filename, &file.bytes)?;
                files.push(SubmittedFile::new(file.filename.clone(), language));
                items.push(BatchItem::Inline {
                    filename: file.filename,
                    base64: STANDARD.encode(&file.bytes),
                    language: language.to_string(),
                });
            }
            BatchInput::Url(url) => {
                validate_url(&url)?;
                files.push(SubmittedFile::from_url(url.clone(), language));
                items.push(BatchItem::Url {
                    url,
                    language: language.to_string(),
                });
            }
        }
    }

    let accepted = backend
        .submit_batch(BatchSubmission { files: items })
        .await
        .map_err(|e| {
            warn!(error = %e, "Batch submission failed");
            AppError::Backend(e)
        })?;

    if accepted.job_id.trim().is_empty() {
        return Err(AppError::Backend(BackendError::Decode(
            "Batch accepted without a job id".to_string(),
        )));
    }

    let status = if accepted.status.is_terminal() {
        warn!(
            job_id = %accepted.job_id,
            status = %accepted.status,
            "Batch acknowledged with a terminal status, tracking it as pending"
        );
        JobStatus::Pending
    } else {
        accepted.status
    };

    let job_id = JobId::remote(accepted.job_id);
    dispatcher.dispatch(ClientEvent::JobCreated {
        job_id: job_id.clone(),
        files,
        status,
        message: accepted.message.clone(),
    })?;

    info!(job_id = %job_id, status = %status, "Batch accepted");
    Ok(BatchReceipt {
        job_id,
        status,
        message: accepted.message,
    })
}
