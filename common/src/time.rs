// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Wall-clock helpers for the `HH:MM` strings used by shifts and attendance logs.
//!
//! All values are same-day local times. No timezone conversion happens here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("Invalid time format: '{0}' (expected HH:MM)")]
    InvalidFormat(String),
}

/// Parses an `HH:MM` string into minutes since midnight.
///
/// Hours must be in `0..=23`, minutes in `0..=59`. A trailing `:SS` part is
/// accepted and ignored so that values read back from SQLite still parse.
pub fn parse_minutes(value: &str) -> Result<u32, TimeError> {
    let invalid = || TimeError::InvalidFormat(value.to_string());
    let mut parts = value.trim().split(':');

    let hours: u32 = parts
        .next()
        .filter(|h| !h.is_empty() && h.len() <= 2)
        .and_then(|h| h.parse().ok())
        .ok_or_else(invalid)?;
    let minutes: u32 = parts
        .next()
        .filter(|m| m.len() == 2)
        .and_then(|m| m.parse().ok())
        .ok_or_else(invalid)?;
    if let Some(seconds) = parts.next() {
        if seconds.len() != 2 || seconds.parse::<u32>().map_or(true, |s| s > 59) {
            return Err(invalid());
        }
    }
    if parts.next().is_some() || hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(hours * 60 + minutes)
}

/// Like [`parse_minutes`] but treats a missing or blank value as `None`.
pub fn parse_optional_minutes(value: Option<&str>) -> Result<Option<u32>, TimeError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_minutes(v).map(Some),
    }
}

/// Formats a minute count as `"Xh Ym"`. Negative input renders as `0h 0m`.
pub fn format_duration(minutes: i64) -> String {
    let m = minutes.max(0);
    format!("{}h {}m", m / 60, m % 60)
}

/// Normalizes a valid time string to `HH:MM`.
pub fn normalize(value: &str) -> Result<String, TimeError> {
    let minutes = parse_minutes(value)?;
    Ok(format!("{:02}:{:02}", minutes / 60, minutes % 60))
}
