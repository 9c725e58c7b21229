// Synchronous Submission Use Case

use crate::application::events::{ClientEvent, Dispatcher};
use crate::application::submission::validate::{validate_document, validate_language};
use crate::application::submission::LocalFile;
use crate::domain::{JobId, JobStatus, JobUpdate, SubmittedFile};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, RecognitionBackend, SyncRecognition, SyncRequest};
use tracing::{info, warn};

/// Execute a synchronous recognition
///
/// The job is created `in_progress` under a local id before the request is
/// sent, so it shows up at once. The answer (or a transport failure) is
/// merged onto it; a failure is additionally returned to the caller.
///
/// # Arguments
///
/// * `backend` - Recognition backend
/// * `dispatcher` - Session dispatcher (owns store and timers)
/// * `id_provider` - Local id generator (injected for determinism)
/// * `file` - Document to recognize
/// * `language` - Recognition language
pub async fn execute(
    backend: &dyn RecognitionBackend,
    dispatcher: &Dispatcher,
    id_provider: &dyn IdProvider,
    file: LocalFile,
    language: &str,
) -> Result<JobId> {
    validate_document(&file.filename, &file.bytes)?;
    validate_language(language)?;

    let job_id = JobId::local(id_provider.generate_id());
    dispatcher.dispatch(ClientEvent::JobCreated {
        job_id: job_id.clone(),
        files: vec![SubmittedFile::new(file.filename.clone(), language)],
        status: JobStatus::InProgress,
        message: None,
    })?;

    let filename = file.filename.clone();
    let request = SyncRequest {
        job_id: job_id.to_string(),
        filename: file.filename,
        bytes: file.bytes,
        language: language.to_string(),
    };

    match backend.recognize(request).await {
        Ok(answer) => {
            let update = completion_update(answer, filename);
            let failed = update.status == Some(JobStatus::Failed);
            dispatcher.dispatch(ClientEvent::StatusRefreshed {
                job_id: job_id.clone(),
                update,
            })?;
            if failed {
                warn!(job_id = %job_id, "Synchronous recognition returned an error");
            } else {
                info!(job_id = %job_id, "Synchronous recognition completed");
            }
            Ok(job_id)
        }
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "Synchronous recognition failed");
            dispatcher.dispatch(ClientEvent::TransportFailed {
                job_id,
                reason: e.reason(),
            })?;
            Err(AppError::Backend(e))
        }
    }
}

/// Terminal update for a synchronous answer; the local filename replaces
/// whatever name the backend reports
fn completion_update(answer: SyncRecognition, filename: String) -> JobUpdate {
    let mut result = answer.result;
    result.filename = filename;

    let mut update = match result.error.clone() {
        Some(error) => JobUpdate::status(JobStatus::Failed).with_error(error),
        None => JobUpdate::status(JobStatus::Completed),
    };
    update.ended_at = answer.ended_at;
    update.duration_ms = answer.duration_ms;
    update.with_results(vec![result])
}
