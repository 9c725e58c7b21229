// Terminal rendering of the dashboard and the focused job

use colored::{ColoredString, Colorize};
use ocrdeck_core::application::presenter::panels::{result_text, timing_panel};
use ocrdeck_core::application::{DashboardRow, LiveDurations};
use ocrdeck_core::domain::{Job, JobStatus};
use std::collections::BTreeMap;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct RowView {
    #[tabled(rename = "Job")]
    job: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

#[derive(Tabled)]
struct LanguageView {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Language")]
    name: String,
}

pub fn status_label(status: JobStatus, active: bool) -> ColoredString {
    let label = if active {
        format!("{} ⟳", status.as_str())
    } else {
        status.as_str().to_string()
    };
    match status {
        JobStatus::Completed => label.green(),
        JobStatus::Failed => label.red(),
        JobStatus::InProgress => label.cyan(),
        JobStatus::Pending => label.yellow(),
    }
}

/// Dashboard table, or the placeholder when there is nothing to show
pub fn dashboard_table(rows: &[DashboardRow], placeholder: Option<&str>) -> String {
    if let Some(message) = placeholder {
        return message.dimmed().to_string();
    }
    let views: Vec<RowView> = rows
        .iter()
        .map(|row| RowView {
            job: row.content.short_id.clone(),
            file: row.content.filename.clone(),
            progress: row.content.progress.clone(),
            status: status_label(row.content.status, row.content.active).to_string(),
            duration: row.content.duration.clone(),
        })
        .collect();
    Table::new(views).with(Style::rounded()).to_string()
}

pub fn languages_table(languages: &BTreeMap<String, String>) -> String {
    let views: Vec<LanguageView> = languages
        .iter()
        .map(|(code, name)| LanguageView {
            code: code.clone(),
            name: name.clone(),
        })
        .collect();
    Table::new(views).with(Style::rounded()).to_string()
}

/// Timing panel plus result text of one job
pub fn job_details(job: &Job, live: &LiveDurations, now_millis: i64) -> String {
    let timing = timing_panel(job, live, now_millis);
    let text = result_text(job).unwrap_or_else(|e| format!("Error: {}", e));

    let mut out = String::new();
    out.push_str(&format!("{} {}\n", "Job:".bold(), job.id));
    out.push_str(&format!(
        "{} {}\n",
        "Status:".bold(),
        status_label(job.status, false)
    ));
    out.push_str(&format!("{} {}\n", "Start:".bold(), timing.start));
    out.push_str(&format!("{} {}\n", "End:".bold(), timing.end));
    out.push_str(&format!("{} {}\n", "Duration:".bold(), timing.duration));
    out.push('\n');
    out.push_str(&text);
    out
}
