// Application Layer - Use Cases and Session Wiring

pub mod config;
pub mod constants;
pub mod events;
pub mod job_store;
pub mod poll_driver;
pub mod presenter;
pub mod session;
pub mod shutdown;
pub mod submission;
pub mod timer;

// Re-exports
pub use config::TrackerConfig;
pub use events::{ClientEvent, Dispatched, Dispatcher, Notification};
pub use job_store::JobStore;
pub use poll_driver::{CycleReport, PollDriver};
pub use presenter::{
    Dashboard, DashboardRow, FocusTracker, LiveDurations, PresentOutcome, ResultPresenter,
};
pub use session::TrackerSession;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use submission::{BatchInput, BatchReceipt, LocalFile, SubmissionService};
pub use timer::{HeartbeatTarget, TickControl, TimerRegistry};
