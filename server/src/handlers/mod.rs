// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod attendance;
pub mod disciplinary;
pub mod employees;
pub mod holidays;
pub mod leaves;
pub mod payroll;
pub mod schedules;
pub mod training;

use crate::database;
use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDate};
use common::ValidationErrors;
use common::leave::LeaveError;
use common::time::TimeError;
use sqlx::SqlitePool;

/// Today's date on the server's local clock. Attendance and leave rules are
/// defined on local calendar days.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Fails with a 422 on `field` unless the employee exists and is active.
pub async fn ensure_employee(pool: &SqlitePool, employee_id: i64, field: &str) -> Result<(), AppError> {
    if database::employees::employee_exists(pool, employee_id).await? {
        Ok(())
    } else {
        Err(ValidationErrors::single(field, format!("Employee {employee_id} does not exist.")).into())
    }
}

// --- Custom Error Handling ---

/// Our custom error type for the application.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
    fields: Option<ValidationErrors>,
}

impl AppError {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            fields: None,
        }
    }

    pub fn not_found(what: &str, id: i64) -> Self {
        Self::new(StatusCode::NOT_FOUND, &format!("{what} with ID {id} not found."))
    }

    pub fn conflict(message: &str) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Maps a unique-constraint hit to a 422 on `field`; anything else stays internal.
    pub fn duplicate_or_internal(err: anyhow::Error, field: &str, message: &str) -> Self {
        if database::is_unique_violation(&err) {
            tracing::warn!("Rejected duplicate on '{}': {:#}", field, err);
            ValidationErrors::single(field, message).into()
        } else {
            err.into()
        }
    }
}

/// Allows converting an `anyhow::Error` (coming from the database layer)
/// into our `AppError`. The cause is logged and never sent to the client.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal server error: {:?}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred.")
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self {
            code: StatusCode::UNPROCESSABLE_ENTITY,
            message: "The given data was invalid.".to_string(),
            fields: Some(errors),
        }
    }
}

impl From<LeaveError> for AppError {
    fn from(err: LeaveError) -> Self {
        ValidationErrors::from(err).into()
    }
}

/// Stored times are validated on the way in, so a parse failure while
/// deriving is a data problem, not a client one.
impl From<TimeError> for AppError {
    fn from(err: TimeError) -> Self {
        anyhow::Error::from(err)
            .context("Stored time value could not be parsed")
            .into()
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        let body = match self.fields {
            Some(fields) => serde_json::json!({ "error": self.message, "fields": fields }),
            None => serde_json::json!({ "error": self.message }),
        };
        (self.code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_errors_become_422_with_fields() {
        let err: AppError = ValidationErrors::single("date_to", "An end date is required.").into();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "The given data was invalid.");
        assert_eq!(body["fields"]["date_to"][0], "An end date is required.");
    }

    #[tokio::test]
    async fn test_internal_errors_hide_their_cause() {
        let err: AppError = anyhow::anyhow!("no such table: employees").into();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "An internal error occurred." }));
    }
}
