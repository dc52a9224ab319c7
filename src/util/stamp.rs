//! Minute-resolution timestamp stamps (`yyyymmddHHMM`) and date arguments (`yyyymmdd`).

use chrono::{NaiveDate, NaiveDateTime};

use crate::core::ConfigError;

/// Format used for event start times, e.g. `202203041550`.
pub const MINUTE_STAMP_FORMAT: &str = "%Y%m%d%H%M";

/// Format used for the target calendar date, e.g. `20220304`.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Format written into the `observed_at` column of sample files.
pub const OBSERVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Parse a 12-digit `yyyymmddHHMM` stamp.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidStartTime`] for anything other than exactly
/// twelve ASCII digits forming a valid local date and time.
pub fn parse_minute_stamp(value: &str) -> Result<NaiveDateTime, ConfigError> {
    let invalid = || ConfigError::InvalidStartTime {
        value: value.to_string(),
    };
    if value.len() != 12 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    NaiveDateTime::parse_from_str(value, MINUTE_STAMP_FORMAT).map_err(|_| invalid())
}

/// Render an instant back into `yyyymmddHHMM`.
#[must_use]
pub fn format_minute_stamp(at: NaiveDateTime) -> String {
    at.format(MINUTE_STAMP_FORMAT).to_string()
}

/// Parse an 8-digit `yyyymmdd` date argument.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDate`] for malformed input.
pub fn parse_date(value: &str) -> Result<NaiveDate, ConfigError> {
    let invalid = || ConfigError::InvalidDate {
        value: value.to_string(),
    };
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

/// Render a date as `yyyymmdd`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
