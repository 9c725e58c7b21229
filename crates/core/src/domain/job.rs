// Job Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::result::FileResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of locally generated (synchronous) job ids
pub const LOCAL_ID_PREFIX: &str = "sync-";

/// Display width of a shortened job id
pub const SHORT_ID_LEN: usize = 8;

/// Which id space a job id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOrigin {
    /// Synchronous submission, id generated here, never polled
    Local,
    /// Asynchronous submission, id assigned by the backend
    Remote,
}

/// Job identifier
///
/// The origin is part of the identity, so a local id and a server id can
/// never collide even if their strings happen to match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId {
    origin: JobOrigin,
    value: String,
}

impl JobId {
    pub fn local(token: impl Into<String>) -> Self {
        Self {
            origin: JobOrigin::Local,
            value: token.into(),
        }
    }

    pub fn remote(id: impl Into<String>) -> Self {
        Self {
            origin: JobOrigin::Remote,
            value: id.into(),
        }
    }

    pub fn origin(&self) -> JobOrigin {
        self.origin
    }

    /// Only server-tracked jobs can be refreshed
    pub fn is_pollable(&self) -> bool {
        self.origin == JobOrigin::Remote
    }

    /// Raw id to send in a status request
    pub fn remote_id(&self) -> Option<&str> {
        match self.origin {
            JobOrigin::Remote => Some(&self.value),
            JobOrigin::Local => None,
        }
    }

    /// First `SHORT_ID_LEN` characters of the display form
    pub fn short(&self) -> String {
        self.to_string().chars().take(SHORT_ID_LEN).collect()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            JobOrigin::Local => write!(f, "{}{}", LOCAL_ID_PREFIX, self.value),
            JobOrigin::Remote => write!(f, "{}", self.value),
        }
    }
}

/// Job Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Position in `pending -> in_progress -> {completed | failed}`
    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::InProgress => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(JobStatus::Pending),
            "in_progress" => Some(JobStatus::InProgress),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted file, fixed at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedFile {
    pub filename: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl SubmittedFile {
    pub fn new(filename: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            language: language.into(),
            source_url: None,
        }
    }

    pub fn from_url(url: impl Into<String>, language: impl Into<String>) -> Self {
        let url = url.into();
        let filename = url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(url.as_str())
            .to_string();
        Self {
            filename,
            language: language.into(),
            source_url: Some(url),
        }
    }
}

/// Partial snapshot merged onto a job; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub results: Option<Vec<FileResult>>,
    pub ended_at: Option<i64>,
    pub duration_ms: Option<f64>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Locally synthesized failure (transport error, rejected submit)
    pub fn failed(error: impl Into<String>, now_millis: i64) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            ended_at: Some(now_millis),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_results(mut self, results: Vec<FileResult>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with_ended_at(mut self, ended_at: i64) -> Self {
        self.ended_at = Some(ended_at);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// What a merge actually changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub previous: JobStatus,
    pub current: JobStatus,
    /// The merge moved the job into a terminal status
    pub became_terminal: bool,
    /// The update asked for a status the job may not move to
    pub rejected_status: bool,
    /// Incoming results were shorter than what the job already holds
    pub rejected_shrink: bool,
    /// Incoming results exceeded the submitted file count and were cut
    pub truncated_results: bool,
}

/// Job Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub submitted_files: Vec<SubmittedFile>,
    pub results: Vec<FileResult>,

    pub started_at: i64, // epoch ms
    pub ended_at: Option<i64>,
    /// Authoritative duration reported by the backend
    pub duration_ms: Option<f64>,

    pub error: Option<String>,
    pub message: Option<String>,
}

impl Job {
    /// Create a new job
    ///
    /// # Arguments
    ///
    /// * `id` - Job id (local or server-assigned)
    /// * `submitted_files` - Files of this submission
    /// * `status` - Initial status, must not be terminal
    /// * `started_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: JobId,
        submitted_files: Vec<SubmittedFile>,
        status: JobStatus,
        started_at: i64,
    ) -> Result<Self> {
        if status.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: "NEW".to_string(),
                to: status.to_string(),
            });
        }
        Ok(Self {
            id,
            status,
            submitted_files,
            results: Vec::new(),
            started_at,
            ended_at: None,
            duration_ms: None,
            error: None,
            message: None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Overlay an update onto this job.
    ///
    /// Status only moves forward and never leaves a terminal value.
    /// `ended_at` and `duration_ms` are written only on the terminal
    /// transition (`ended_at` from the update, else `now_millis`) and never
    /// change afterwards. `error` is fill-only while the job is failed.
    /// Results only grow and are capped at the submitted file count.
    pub fn apply(&mut self, update: JobUpdate, now_millis: i64) -> MergeOutcome {
        let previous = self.status;
        let was_terminal = previous.is_terminal();
        let mut rejected_status = false;

        if let Some(next) = update.status {
            if !was_terminal && next.rank() > previous.rank() {
                self.status = next;
            } else if next != previous {
                rejected_status = true;
            }
        }

        let mut rejected_shrink = false;
        let mut truncated_results = false;
        if let Some(mut results) = update.results {
            let cap = self.submitted_files.len();
            if cap > 0 && results.len() > cap {
                results.truncate(cap);
                truncated_results = true;
            }
            if results.len() >= self.results.len() {
                self.results = results;
            } else {
                rejected_shrink = true;
            }
        }

        let became_terminal = !was_terminal && self.status.is_terminal();
        if became_terminal {
            self.ended_at = Some(update.ended_at.unwrap_or(now_millis));
            self.duration_ms = update.duration_ms;
        }

        if self.status == JobStatus::Failed && self.error.is_none() {
            self.error = update.error;
        }

        if update.message.is_some() {
            self.message = update.message;
        }

        MergeOutcome {
            previous,
            current: self.status,
            became_terminal,
            rejected_status,
            rejected_shrink,
            truncated_results,
        }
    }

    /// Elapsed time for display: authoritative duration, else end - start,
    /// else running time up to `now_millis`
    pub fn elapsed_ms(&self, now_millis: i64) -> f64 {
        if let Some(duration) = self.duration_ms {
            return duration;
        }
        let end = self.ended_at.unwrap_or(now_millis);
        (end - self.started_at).max(0) as f64
    }

    /// Results that came back without an error
    pub fn completed_results(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of files this job is expected to produce
    pub fn expected_results(&self) -> usize {
        if self.submitted_files.is_empty() {
            self.results.len()
        } else {
            self.submitted_files.len()
        }
    }

    /// Name shown for the job: first result, else first submitted file
    pub fn representative_filename(&self) -> Option<&str> {
        if let Some(first) = self.results.first() {
            if !first.filename.is_empty() {
                return Some(&first.filename);
            }
            if !first.source.is_empty() {
                return Some(&first.source);
            }
        }
        self.submitted_files.first().map(|f| {
            if f.filename.is_empty() {
                f.source_url.as_deref().unwrap_or_default()
            } else {
                f.filename.as_str()
            }
        })
    }
}
