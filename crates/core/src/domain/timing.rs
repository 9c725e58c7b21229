// Timing helpers: wire parsing and display formatting

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// Placeholder for absent timestamps
pub const NOT_AVAILABLE: &str = "N/A";

/// Format milliseconds as `MM:SS.mmm` (minutes keep counting past 59)
pub fn format_duration(ms: f64) -> String {
    let total = if ms.is_finite() && ms > 0.0 {
        ms.floor() as u64
    } else {
        0
    };
    let minutes = total / 60_000;
    let seconds = (total % 60_000) / 1000;
    let millis = total % 1000;
    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}

/// Format an epoch-ms timestamp as local `HH:MM:SS.mmm`
pub fn format_clock(epoch_ms: Option<i64>) -> String {
    epoch_ms
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Parse an ISO-8601 timestamp into epoch ms.
///
/// Accepts RFC 3339 and offset-less local times (`2026-02-23T12:00:00.123456`).
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

/// Parse a backend duration such as `"1234.56ms"`; `"N/A"` and garbage give `None`
pub fn parse_duration_ms(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().strip_suffix("ms")?.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}
