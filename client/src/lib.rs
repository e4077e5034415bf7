// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! HTTP client for the HR API.
//!
//! Plain request/response mapping: no retries and no caching. Failures are
//! categorized by status into [`ClientError`], with database-looking messages
//! scrubbed before they can reach a user.
pub mod api;
pub mod error;
pub mod session;

pub use api::{ApiClient, RolloverSummary, SavedPayroll};
pub use error::{ClientError, ClientResult, sanitize_message};
pub use session::{Session, SessionUser};
