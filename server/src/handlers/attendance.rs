// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::schedules::DateQuery;
use super::{AppError, ensure_employee, today};
use crate::database;
use axum::extract::{Json, Query, State};
use common::{AttendanceLog, AttendanceLogPayload, AttendanceRow};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Handler for the attendance sheet of one date (today by default).
///
/// One row per scheduled shift, with status and hours derived from the
/// day's log. Employees without a shift that day are not listed.
pub async fn attendance_sheet(
    State(pool): State<SqlitePool>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<AttendanceRow>>, AppError> {
    let today = today();
    let date = query.date.unwrap_or(today);

    let shifts = database::schedules::shifts_on(&pool, date).await?;
    let logs = database::attendance::logs_between(&pool, date, date).await?;

    let rows = shifts
        .into_iter()
        .map(|shift| {
            let log = logs.iter().find(|l| l.employee_id == shift.employee_id);
            AttendanceRow::derive(
                shift.employee_id,
                shift.employee_name,
                shift.schedule_date,
                &shift.start_time,
                &shift.end_time,
                log,
                today,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!("Derived {} attendance rows for {}.", rows.len(), date);
    Ok(Json(rows))
}

pub async fn list_logs(
    State(pool): State<SqlitePool>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<AttendanceLog>>, AppError> {
    let date = query.date.unwrap_or_else(today);
    Ok(Json(database::attendance::logs_between(&pool, date, date).await?))
}

/// Handler for recording sign-in/out and break times.
/// A second log for the same employee and date replaces the first.
pub async fn record_log(
    State(pool): State<SqlitePool>,
    Json(payload): Json<AttendanceLogPayload>,
) -> Result<Json<AttendanceLog>, AppError> {
    debug!(
        "Received attendance for employee {} on {}",
        payload.employee_id, payload.log_date
    );
    let payload = payload.normalized()?;
    ensure_employee(&pool, payload.employee_id, "employee_id").await?;

    let log = database::attendance::upsert_log(&pool, payload).await?;
    info!(
        "Attendance saved for employee {} on {}.",
        log.employee_id, log.log_date
    );
    Ok(Json(log))
}
