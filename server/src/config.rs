// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Server configuration, read from environment variables.
use anyhow::{Context, Result};
use common::LeaveDefaults;
use std::time::Duration;

const DEFAULT_DB_URL: &str = "sqlite://database/hrms.db";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ROLLOVER_INTERVAL_SECS: u64 = 5 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL (env: DATABASE_URL)
    pub database_url: String,
    /// HTTP port (env: HTTP_PORT)
    pub http_port: u16,
    /// Yearly allotments granted on credit rollover
    /// (env: LEAVE_DEFAULT_VACATION, LEAVE_DEFAULT_SICK, LEAVE_DEFAULT_EMERGENCY)
    pub leave_defaults: LeaveDefaults,
    /// How often the rollover task checks for a new year (env: ROLLOVER_INTERVAL_SECS)
    pub rollover_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DB_URL.to_string(),
            http_port: DEFAULT_PORT,
            leave_defaults: LeaveDefaults::default(),
            rollover_interval: Duration::from_secs(DEFAULT_ROLLOVER_INTERVAL_SECS),
        }
    }
}

/// Parses an optional variable, failing loudly on a present-but-invalid value.
fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T> {
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .ok()
            .with_context(|| format!("{name} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let leave = defaults.leave_defaults;

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.database_url),
            http_port: parse_var(&lookup, "HTTP_PORT", defaults.http_port)?,
            leave_defaults: LeaveDefaults {
                vacation: parse_var(&lookup, "LEAVE_DEFAULT_VACATION", leave.vacation)?,
                sick: parse_var(&lookup, "LEAVE_DEFAULT_SICK", leave.sick)?,
                emergency: parse_var(&lookup, "LEAVE_DEFAULT_EMERGENCY", leave.emergency)?,
            },
            rollover_interval: Duration::from_secs(parse_var(
                &lookup,
                "ROLLOVER_INTERVAL_SECS",
                DEFAULT_ROLLOVER_INTERVAL_SECS,
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DB_URL);
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.leave_defaults, LeaveDefaults::default());
        assert_eq!(config.rollover_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("HTTP_PORT", "8081"),
            ("LEAVE_DEFAULT_SICK", "10"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.http_port, 8081);
        assert_eq!(config.leave_defaults.sick, 10);
        assert_eq!(config.leave_defaults.vacation, 15);

        let err = Config::from_lookup(lookup(&[("HTTP_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("HTTP_PORT"));
    }
}
