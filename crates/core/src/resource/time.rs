//! Clock-time parsing and formatting.
//!
//! Resource documents write clock-times in 12-hour form (`09:30 AM`); the
//! reservation form posts them back the same way.

use chrono::NaiveTime;
use serde::Serializer;

use super::error::ConfigError;

/// Display and parse format for clock-times.
pub const AM_PM_TIME_FORMAT: &str = "%I:%M %p";

/// Parses a clock-time in `hh:mm AM/PM` form, falling back to 24-hour `HH:MM`.
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, ConfigError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, AM_PM_TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| ConfigError::InvalidClockTime(value.to_string()))
}

/// Formats a clock-time as `hh:mm AM/PM`.
pub fn format_clock_time(time: NaiveTime) -> String {
    time.format(AM_PM_TIME_FORMAT).to_string()
}

/// Serializes a clock-time in the same form resource documents use.
pub fn serialize_clock_time<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_clock_time(*time))
}
