// Result Presenter - everything the user sees of a job

pub mod dashboard;
pub mod focus;
mod live;
pub mod panels;
pub mod visual;

pub use dashboard::{shorten_filename, Dashboard, DashboardRow, RowContent, NO_JOBS_MESSAGE};
pub use focus::FocusTracker;
pub use live::LiveDurations;
pub use panels::{result_text, timing_panel, TimingPanel, RUNNING_TEXT};
pub use visual::{document_for, PresentOutcome, ResultPresenter};
