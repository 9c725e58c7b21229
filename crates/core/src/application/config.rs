// Tracker configuration

use crate::application::constants::{
    DEFAULT_POLL_INTERVAL, DEFAULT_STATIC_PREFIX, DEFAULT_TICKER_INTERVAL,
};
use crate::port::OverlayStyle;
use std::time::Duration;
use tracing::warn;

/// Runtime settings of a tracking session
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Heartbeat period
    pub poll_interval: Duration,
    /// Per-job duration ticker period
    pub ticker_interval: Duration,
    /// Prefix `filepath://` references are rewritten to
    pub static_prefix: String,
    /// Base URL relative sources are resolved against (None: local paths)
    pub asset_base_url: Option<String>,
    pub overlay_style: OverlayStyle,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            ticker_interval: DEFAULT_TICKER_INTERVAL,
            static_prefix: DEFAULT_STATIC_PREFIX.to_string(),
            asset_base_url: None,
            overlay_style: OverlayStyle::default(),
        }
    }
}

impl TrackerConfig {
    /// A zero interval falls back to the default
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = non_zero_or("poll_interval", interval, DEFAULT_POLL_INTERVAL);
        self
    }

    /// A zero interval falls back to the default
    pub fn with_ticker_interval(mut self, interval: Duration) -> Self {
        self.ticker_interval = non_zero_or("ticker_interval", interval, DEFAULT_TICKER_INTERVAL);
        self
    }

    /// Replace zero intervals (set through the public fields) by the defaults
    pub fn normalized(self) -> Self {
        let poll_interval = self.poll_interval;
        let ticker_interval = self.ticker_interval;
        self.with_poll_interval(poll_interval)
            .with_ticker_interval(ticker_interval)
    }

    pub fn with_asset_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.asset_base_url = Some(base_url.into());
        self
    }
}

fn non_zero_or(name: &str, interval: Duration, default: Duration) -> Duration {
    if interval.is_zero() {
        warn!(
            setting = name,
            default_ms = default.as_millis() as u64,
            "Zero interval replaced by the default"
        );
        default
    } else {
        interval
    }
}
