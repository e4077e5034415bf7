// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::NaiveDate;
use common::{AttendanceLog, AttendanceLogPayload};
use sqlx::SqlitePool;
use tracing::debug;

/// Inserts the log for (employee, date) or replaces the existing one.
/// The payload must already be normalized.
pub async fn upsert_log(pool: &SqlitePool, payload: AttendanceLogPayload) -> Result<AttendanceLog> {
    debug!(
        "Upserting attendance for employee {} on {}: in={:?} out={:?}",
        payload.employee_id, payload.log_date, payload.sign_in, payload.sign_out
    );

    sqlx::query(
        "INSERT INTO attendance_logs (employee_id, log_date, sign_in, sign_out, break_out, break_in)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (employee_id, log_date) DO UPDATE SET
            sign_in = excluded.sign_in,
            sign_out = excluded.sign_out,
            break_out = excluded.break_out,
            break_in = excluded.break_in",
    )
    .bind(payload.employee_id)
    .bind(payload.log_date)
    .bind(&payload.sign_in)
    .bind(&payload.sign_out)
    .bind(&payload.break_out)
    .bind(&payload.break_in)
    .execute(pool)
    .await
    .context("Failed to save attendance log")?;

    sqlx::query_as::<_, AttendanceLog>(
        "SELECT * FROM attendance_logs WHERE employee_id = ? AND log_date = ?",
    )
    .bind(payload.employee_id)
    .bind(payload.log_date)
    .fetch_one(pool)
    .await
    .context("Failed to read back attendance log")
}

pub async fn logs_between(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<AttendanceLog>> {
    sqlx::query_as::<_, AttendanceLog>(
        "SELECT * FROM attendance_logs WHERE log_date BETWEEN ? AND ? ORDER BY log_date ASC, employee_id ASC",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to retrieve attendance logs from {start} to {end}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::setup_test_db;

    #[tokio::test]
    async fn test_one_log_per_employee_and_date() {
        let pool = setup_test_db().await.unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let first = upsert_log(
            &pool,
            AttendanceLogPayload {
                employee_id: 1,
                log_date: day,
                sign_in: Some("09:00".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let second = upsert_log(
            &pool,
            AttendanceLogPayload {
                employee_id: 1,
                log_date: day,
                sign_in: Some("09:00".to_string()),
                sign_out: Some("18:00".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.sign_out.as_deref(), Some("18:00"));
        assert_eq!(logs_between(&pool, day, day).await.unwrap().len(), 1);
    }
}
