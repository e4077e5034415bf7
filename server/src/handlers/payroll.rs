// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::{AppError, today};
use crate::database::{self, payroll::SavedPayroll};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use common::payroll::{self, PayrollInput};
use common::{
    AdjustmentsPayload, GeneratePayrollPayload, PayrollComputation, PayrollRecord, PayrollStatus,
    ValidationErrors,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

/// Loads everything a payroll run reads and computes gross pay.
/// Nothing is stored.
async fn compute(
    pool: &SqlitePool,
    payload: &GeneratePayrollPayload,
) -> Result<Vec<PayrollComputation>, AppError> {
    payload.validate()?;
    let (start, end) = (payload.period_start, payload.period_end);

    if let Some(ids) = &payload.employee_ids {
        let mut errors = ValidationErrors::new();
        for &id in ids {
            if !database::employees::employee_exists(pool, id).await? {
                errors.add("employee_ids", format!("Employee {id} does not exist."));
            }
        }
        errors.into_result()?;
    }

    let employees =
        database::employees::payroll_employees(pool, payload.employee_ids.as_deref()).await?;
    let shifts = database::schedules::shifts_between(pool, start, end).await?;
    let logs = database::attendance::logs_between(pool, start, end).await?;
    let holidays = database::holidays::holidays_between(pool, start, end).await?;
    let leaves = database::leaves::approved_between(pool, start, end).await?;
    debug!(
        "Payroll {} to {}: {} employees, {} shifts, {} logs, {} holidays, {} approved leaves",
        start,
        end,
        employees.len(),
        shifts.len(),
        logs.len(),
        holidays.len(),
        leaves.len()
    );

    let computations = payroll::generate(&PayrollInput {
        period_start: start,
        period_end: end,
        today: today(),
        employees: &employees,
        shifts: &shifts,
        logs: &logs,
        holidays: &holidays,
        leaves: &leaves,
    })?;
    Ok(computations)
}

/// Handler for previewing a payroll run without storing it.
pub async fn preview_payroll(
    State(pool): State<SqlitePool>,
    Json(payload): Json<GeneratePayrollPayload>,
) -> Result<Json<Vec<PayrollComputation>>, AppError> {
    let computations = compute(&pool, &payload).await?;
    info!("Previewed payroll for {} employees.", computations.len());
    Ok(Json(computations))
}

/// Handler for generating and storing payroll records for a period.
pub async fn generate_payroll(
    State(pool): State<SqlitePool>,
    Json(payload): Json<GeneratePayrollPayload>,
) -> Result<(StatusCode, Json<SavedPayroll>), AppError> {
    let computations = compute(&pool, &payload).await?;
    let saved = database::payroll::save_generated(&pool, &computations).await?;
    info!(
        "Generated payroll for {} to {}: {} stored, {} already paid.",
        payload.period_start,
        payload.period_end,
        saved.records.len(),
        saved.skipped_paid.len()
    );
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn list_payroll(
    State(pool): State<SqlitePool>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<PayrollRecord>>, AppError> {
    let period = match (query.period_start, query.period_end) {
        (Some(start), Some(end)) => Some((start, end)),
        (None, None) => None,
        (Some(_), None) => {
            return Err(ValidationErrors::single("period_end", "Both period dates are required.").into());
        }
        (None, Some(_)) => {
            return Err(ValidationErrors::single("period_start", "Both period dates are required.").into());
        }
    };
    Ok(Json(database::payroll::list_payroll(&pool, period).await?))
}

async fn pending_record(pool: &SqlitePool, payroll_id: i64) -> Result<PayrollRecord, AppError> {
    let record = database::payroll::get_payroll(pool, payroll_id)
        .await?
        .ok_or_else(|| AppError::not_found("Payroll record", payroll_id))?;
    if record.status == PayrollStatus::Paid {
        return Err(AppError::conflict(&format!(
            "Payroll record {payroll_id} is already paid."
        )));
    }
    Ok(record)
}

/// Handler for editing allowances, bonuses, loan repayment and deductions.
pub async fn update_adjustments(
    State(pool): State<SqlitePool>,
    Path(payroll_id): Path<i64>,
    Json(payload): Json<AdjustmentsPayload>,
) -> Result<Json<PayrollRecord>, AppError> {
    payload.validate()?;
    pending_record(&pool, payroll_id).await?;

    let record = database::payroll::update_adjustments(&pool, payroll_id, &payload)
        .await?
        .ok_or_else(|| AppError::conflict(&format!("Payroll record {payroll_id} is already paid.")))?;
    info!("Payroll record {} adjusted, net pay {}.", payroll_id, record.net_pay);
    Ok(Json(record))
}

pub async fn mark_paid(
    State(pool): State<SqlitePool>,
    Path(payroll_id): Path<i64>,
) -> Result<Json<PayrollRecord>, AppError> {
    let record = pending_record(&pool, payroll_id).await?;
    if !database::payroll::mark_paid(&pool, payroll_id).await? {
        return Err(AppError::conflict(&format!(
            "Payroll record {payroll_id} is already paid."
        )));
    }
    info!("Payroll record {} marked as paid.", payroll_id);
    Ok(Json(PayrollRecord {
        status: PayrollStatus::Paid,
        ..record
    }))
}
