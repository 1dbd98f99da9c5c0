//! `snapkit_log`: timestamped console logging for snapkit binaries.
//!
//! Every line reads `[<timestamp>] <message>`. Informational output goes to
//! stdout, warnings and errors to stderr.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// `strftime` layout of the bracketed prefix.
pub const C_TIMESTAMP_FORMAT: &str = "[%Y-%m-%dT%H:%M:%S%.3f%:z]";

#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}

/// Render `datetime` the way it prefixes every log line.
pub fn format_timestamp<Tz>(datetime: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    datetime.format(C_TIMESTAMP_FORMAT).to_string()
}

/// Local wall-clock timer producing [`C_TIMESTAMP_FORMAT`] prefixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerBracketed;

impl FormatTime for TimerBracketed {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", format_timestamp(&Local::now()))
    }
}

/// Default filter directive; `RUST_LOG` takes precedence when set.
pub fn derive_default_filter(if_verbose: bool) -> &'static str {
    if if_verbose { "debug" } else { "info" }
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init_logging(if_verbose: bool) -> Result<(), LogInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(derive_default_filter(if_verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(TimerBracketed)
        .with_target(false)
        .with_level(false)
        .with_ansi(false)
        .with_writer(
            std::io::stderr
                .with_max_level(Level::WARN)
                .or_else(std::io::stdout),
        )
        .try_init()
        .map_err(|e| LogInitError::Install(e.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone, Utc};

    use super::*;

    #[test]
    fn timestamp_is_bracketed_iso_8601_with_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).expect("offset");
        let datetime = offset
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("datetime");
        assert_eq!(
            format_timestamp(&datetime),
            "[2024-03-09T07:05:01.000+02:00]"
        );
    }

    #[test]
    fn timestamp_in_utc() {
        let datetime = Utc
            .with_ymd_and_hms(2023, 12, 31, 23, 59, 59)
            .single()
            .expect("datetime");
        assert_eq!(
            format_timestamp(&datetime),
            "[2023-12-31T23:59:59.000+00:00]"
        );
    }

    #[test]
    fn verbose_switches_default_filter() {
        assert_eq!(derive_default_filter(false), "info");
        assert_eq!(derive_default_filter(true), "debug");
    }
}
