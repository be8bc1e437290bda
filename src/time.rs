//! Wall-clock helpers: accepted input formats, output rendering and the
//! injectable clock.
//!
//! All event times are naive local datetimes.

use std::sync::Arc;

use chrono::NaiveDateTime;
use mockable::Clock;

use crate::error::AppError;

/// Clock shared between the registry and the session store.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Tried in order; the first format that parses wins.
const INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn parse_datetime(input: &str) -> Result<NaiveDateTime, AppError> {
    let trimmed = input.trim();

    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| {
            AppError::Validation("invalid time format, expected e.g. 2025-11-15 14:30".to_string())
        })
}

/// `YYYY-MM-DD HH:MM`, the only output shape for datetimes.
pub fn format_minutes(dt: &NaiveDateTime) -> String {
    dt.format(MINUTE_FORMAT).to_string()
}

pub fn local_now(clock: &dyn Clock) -> NaiveDateTime {
    clock.local().naive_local()
}

/// Seconds since the Unix epoch, for session expiry.
pub fn unix_now(clock: &dyn Clock) -> i64 {
    clock.utc().timestamp()
}
