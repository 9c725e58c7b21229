// Timing and result-text panels of the focused job

use crate::application::presenter::LiveDurations;
use crate::domain::timing::{format_clock, format_duration};
use crate::domain::{Job, JobStatus};
use crate::error::Result;

/// End-time text while a job is still running
pub const RUNNING_TEXT: &str = "Running...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingPanel {
    pub start: String,
    pub end: String,
    pub duration: String,
}

/// Start, end and duration of a job; running jobs show the live ticker value
pub fn timing_panel(job: &Job, live: &LiveDurations, now_millis: i64) -> TimingPanel {
    if job.is_terminal() {
        TimingPanel {
            start: format_clock(Some(job.started_at)),
            end: format_clock(job.ended_at),
            duration: format_duration(job.elapsed_ms(now_millis)),
        }
    } else {
        let elapsed = live
            .get(&job.id)
            .unwrap_or_else(|| job.elapsed_ms(now_millis));
        TimingPanel {
            start: format_clock(Some(job.started_at)),
            end: RUNNING_TEXT.to_string(),
            duration: format_duration(elapsed),
        }
    }
}

/// Text view of a job: `Error: <msg>` for failures, else the results as
/// pretty-printed JSON (the status message while no result exists)
pub fn result_text(job: &Job) -> Result<String> {
    if job.status == JobStatus::Failed {
        if let Some(error) = &job.error {
            return Ok(format!("Error: {}", error));
        }
    }
    if job.results.is_empty() {
        return Ok(job.message.clone().unwrap_or_default());
    }
    Ok(serde_json::to_string_pretty(&job.results)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FileResult, JobId, JobUpdate, SubmittedFile};

    fn running(started_at: i64) -> Job {
        Job::new(
            JobId::remote("job"),
            vec![SubmittedFile::new("a.png", "en")],
            JobStatus::InProgress,
            started_at,
        )
        .unwrap()
    }

    #[test]
    fn test_running_panel_uses_live_value() {
        let job = running(0);
        let live = LiveDurations::new();

        let panel = timing_panel(&job, &live, 2_000);
        assert_eq!(panel.end, RUNNING_TEXT);
        assert_eq!(panel.duration, "00:02.000");

        live.publish(&job.id, 1_900.0);
        assert_eq!(timing_panel(&job, &live, 2_000).duration, "00:01.900");
    }

    #[test]
    fn test_terminal_panel_prefers_backend_duration() {
        let mut job = running(0);
        job.apply(
            JobUpdate::status(JobStatus::Completed)
                .with_ended_at(5_000)
                .with_duration_ms(4_321.0),
            5_000,
        );
        let panel = timing_panel(&job, &LiveDurations::new(), 99_000);
        assert_eq!(panel.duration, "00:04.321");
        assert_ne!(panel.end, RUNNING_TEXT);
    }

    #[test]
    fn test_result_text_variants() {
        let mut job = running(0);
        job.message = Some("Job queued".into());
        assert_eq!(result_text(&job).unwrap(), "Job queued");

        job.apply(
            JobUpdate::status(JobStatus::Completed).with_results(vec![FileResult {
                filename: "a.png".into(),
                text: Some("Hello".into()),
                ..Default::default()
            }]),
            1,
        );
        let text = result_text(&job).unwrap();
        assert!(text.contains("\"filename\": \"a.png\""));
        assert!(text.contains("Hello"));

        let mut failed = running(0);
        failed.apply(JobUpdate::failed("Invalid file format", 1), 1);
        assert_eq!(result_text(&failed).unwrap(), "Error: Invalid file format");
    }
}
