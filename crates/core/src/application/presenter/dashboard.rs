// Job dashboard: one stable row per job, in submission order

use crate::application::constants::{FILENAME_DISPLAY_KEEP, FILENAME_DISPLAY_MAX};
use crate::application::presenter::LiveDurations;
use crate::domain::timing::{format_duration, NOT_AVAILABLE};
use crate::domain::{Job, JobId, JobStatus};
use std::collections::HashMap;

/// Shown instead of the table when no job exists
pub const NO_JOBS_MESSAGE: &str = "No active jobs yet.";

/// Display values of one row
#[derive(Debug, Clone, PartialEq)]
pub struct RowContent {
    pub short_id: String,
    pub filename: String,
    /// `completed/total`, completed counts results without error
    pub progress: String,
    pub status: JobStatus,
    /// In-progress indicator
    pub active: bool,
    pub duration: String,
}

/// Dashboard row; `row_id` survives every refresh of the same job
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRow {
    pub row_id: u64,
    pub job_id: JobId,
    /// Bumped only when the content changed
    pub revision: u64,
    pub content: RowContent,
}

/// Keyed row model; refreshes update rows in place instead of rebuilding them
#[derive(Debug, Default)]
pub struct Dashboard {
    rows: Vec<DashboardRow>,
    by_job: HashMap<JobId, usize>,
    next_row_id: u64,
}

/// Cut long names to 17 characters plus `...`
pub fn shorten_filename(name: &str) -> String {
    if name.chars().count() > FILENAME_DISPLAY_MAX {
        let head: String = name.chars().take(FILENAME_DISPLAY_KEEP).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// Row values of a job at `now_millis`
pub fn row_content(job: &Job, live: &LiveDurations, now_millis: i64) -> RowContent {
    let duration = if job.is_terminal() {
        format_duration(job.elapsed_ms(now_millis))
    } else {
        live.get(&job.id)
            .map(format_duration)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    RowContent {
        short_id: job.id.short(),
        filename: shorten_filename(job.representative_filename().unwrap_or_default()),
        progress: format!("{}/{}", job.completed_results(), job.expected_results()),
        status: job.status,
        active: job.status == JobStatus::InProgress,
        duration,
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh from jobs in canonical order (see `JobStore::list_sorted_by_submission`)
    pub fn refresh(&mut self, jobs: &[Job], live: &LiveDurations, now_millis: i64) -> &[DashboardRow] {
        let mut previous: HashMap<JobId, DashboardRow> = self
            .rows
            .drain(..)
            .map(|row| (row.job_id.clone(), row))
            .collect();
        self.by_job.clear();

        for job in jobs {
            let content = row_content(job, live, now_millis);
            let row = match previous.remove(&job.id) {
                Some(mut row) => {
                    if row.content != content {
                        row.content = content;
                        row.revision += 1;
                    }
                    row
                }
                None => {
                    self.next_row_id += 1;
                    DashboardRow {
                        row_id: self.next_row_id,
                        job_id: job.id.clone(),
                        revision: 0,
                        content,
                    }
                }
            };
            self.by_job.insert(job.id.clone(), self.rows.len());
            self.rows.push(row);
        }

        &self.rows
    }

    pub fn rows(&self) -> &[DashboardRow] {
        &self.rows
    }

    pub fn row(&self, job_id: &JobId) -> Option<&DashboardRow> {
        self.by_job.get(job_id).and_then(|idx| self.rows.get(*idx))
    }

    /// Placeholder text when there is nothing to list
    pub fn placeholder(&self) -> Option<&'static str> {
        if self.rows.is_empty() {
            Some(NO_JOBS_MESSAGE)
        } else {
            None
        }
    }
}
