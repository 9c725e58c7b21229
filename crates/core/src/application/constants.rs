// Tracker constants (no magic values)
use std::time::Duration;

/// Heartbeat period for refreshing server-tracked jobs (1s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Live-duration ticker period per running job (100ms)
pub const DEFAULT_TICKER_INTERVAL: Duration = Duration::from_millis(100);

/// Static-asset prefix a `filepath://` source reference resolves to
pub const DEFAULT_STATIC_PREFIX: &str = "/static/uploads/";

/// Capacity of the notification broadcast channel
pub const NOTIFICATION_CAPACITY: usize = 256;

/// Filenames longer than this are shortened on the dashboard
pub const FILENAME_DISPLAY_MAX: usize = 20;

/// Characters kept when a filename is shortened (before the ellipsis)
pub const FILENAME_DISPLAY_KEEP: usize = 17;

/// Default recognition language
pub const DEFAULT_LANGUAGE: &str = "en";
