// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Client error types, categorized by HTTP status.
use common::ValidationErrors;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Shown instead of any message that looks like it leaked from the database.
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again later.";

lazy_static! {
    // Fragments that only show up in raw database or SQL errors.
    static ref SQL_PATTERNS: Vec<Regex> = [
        r"(?i)\bsqlstate\b",
        r"(?i)\bsqlx?\b",
        r"(?i)\bsqlite\w*\b",
        r"(?i)\bsyntax error\b",
        r"(?i)\bconstraint (failed|violation)\b",
        r"(?i)\bno such (table|column)\b",
        r"(?i)\bselect\s+(\*|[\w.]+(\s*,\s*[\w.]+)*)\s+from\b",
        r"(?i)\binsert\s+into\b",
        r"(?i)\bupdate\s+\w+\s+set\b",
        r"(?i)\bdelete\s+from\b",
        r"(?i)\bdatabase\b",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect();
}

/// Returns `message` unless it contains SQL or database-looking fragments,
/// in which case the generic message is returned.
pub fn sanitize_message(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() || SQL_PATTERNS.iter().any(|re| re.is_match(trimmed)) {
        return GENERIC_MESSAGE.to_string();
    }
    trimmed.to_string()
}

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session was rejected; it has already been cleared.
    #[error("Your session has expired. Please log in again.")]
    Unauthorized,

    /// 422 with the server's field-level messages.
    #[error("{message}")]
    Validation {
        message: String,
        fields: ValidationErrors,
    },

    #[error("{0}")]
    NotFound(String),

    /// The resource is not in a state that allows the change.
    #[error("{0}")]
    Conflict(String),

    /// Any other failure reported by the server. Always safe to display.
    #[error("{0}")]
    Server(String),

    /// Transport or decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    /// Field messages of a validation error, if any.
    pub fn fields(&self) -> Option<&ValidationErrors> {
        match self {
            ClientError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
