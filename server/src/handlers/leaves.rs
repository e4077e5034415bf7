// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::{AppError, ensure_employee, today};
use crate::database::{self, leaves as db};
use crate::state::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::{Datelike, NaiveDate};
use common::leave::compute_span;
use common::{
    CreateLeavePayload, CreditBalance, LeaveRequest, LeaveStatus, LeaveStatusPayload,
    LeaveType, SetCreditPayload,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct LeaveFilter {
    pub employee_id: Option<i64>,
    pub status: Option<LeaveStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreditQuery {
    pub year: Option<i32>,
}

pub async fn list_leaves(
    State(pool): State<SqlitePool>,
    Query(filter): Query<LeaveFilter>,
) -> Result<Json<Vec<LeaveRequest>>, AppError> {
    let leaves = db::list_leaves(&pool, filter.employee_id, filter.status).await?;
    info!("Successfully retrieved {} leave requests.", leaves.len());
    Ok(Json(leaves))
}

/// Fails unless the employee's remaining credit for the year of `date_from`
/// covers `days`. Statutory leave types are never charged against credits.
async fn check_credits(
    pool: &SqlitePool,
    employee_id: i64,
    leave_type: LeaveType,
    date_from: NaiveDate,
    days: i64,
) -> Result<(), AppError> {
    if !leave_type.uses_credits() {
        return Ok(());
    }
    let balance = db::credit_balance(pool, employee_id, leave_type, date_from.year()).await?;
    debug!(
        "Credit check for employee {}: {} remaining, {} requested",
        employee_id, balance.remaining_days, days
    );
    balance.ensure_covers(days)?;
    Ok(())
}

/// Handler for filing a leave request.
///
/// The date range and day count are derived from the leave type; the
/// request is stored as Pending.
pub async fn create_leave(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateLeavePayload>,
) -> Result<(StatusCode, Json<LeaveRequest>), AppError> {
    debug!(
        "Received {:?} leave request for employee {}",
        payload.leave_type, payload.employee_id
    );
    ensure_employee(&pool, payload.employee_id, "employee_id").await?;
    let span = compute_span(&payload)?;

    check_credits(&pool, payload.employee_id, payload.leave_type, span.date_from, span.days).await?;

    let request = db::create_leave(&pool, &payload, span).await?;
    info!(
        "Leave request {} filed: {} day(s) from {} to {}.",
        request.id, request.days, request.date_from, request.date_to
    );
    Ok((StatusCode::CREATED, Json(request)))
}

/// Handler for approving, declining or canceling a Pending request.
/// Credits are checked again on approval, against the balance at that time.
pub async fn update_leave_status(
    State(pool): State<SqlitePool>,
    Path(leave_id): Path<i64>,
    Json(payload): Json<LeaveStatusPayload>,
) -> Result<Json<LeaveRequest>, AppError> {
    let request = db::get_leave(&pool, leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request", leave_id))?;

    if !request.status.can_transition_to(payload.status) {
        return Err(AppError::conflict(&format!(
            "Leave request {} is {:?} and cannot become {:?}.",
            leave_id, request.status, payload.status
        )));
    }
    if payload.status == LeaveStatus::Approved {
        check_credits(
            &pool,
            request.employee_id,
            request.leave_type,
            request.date_from,
            request.days,
        )
        .await?;
    }

    if !db::update_leave_status(&pool, leave_id, request.status, payload.status).await? {
        return Err(AppError::conflict(&format!(
            "Leave request {leave_id} was decided by someone else."
        )));
    }
    info!("Leave request {} is now {:?}.", leave_id, payload.status);
    Ok(Json(LeaveRequest {
        status: payload.status,
        ..request
    }))
}

// --- Credits ---

pub async fn credit_balances(
    State(pool): State<SqlitePool>,
    Path(employee_id): Path<i64>,
    Query(query): Query<CreditQuery>,
) -> Result<Json<Vec<CreditBalance>>, AppError> {
    if !database::employees::employee_exists(&pool, employee_id).await? {
        return Err(AppError::not_found("Employee", employee_id));
    }
    let year = query.year.unwrap_or_else(|| today().year());
    Ok(Json(db::credit_balances(&pool, employee_id, year).await?))
}

/// Handler for setting the yearly allotment of one credit-based leave type.
pub async fn set_credit(
    State(pool): State<SqlitePool>,
    Json(payload): Json<SetCreditPayload>,
) -> Result<Json<CreditBalance>, AppError> {
    payload.validate()?;
    ensure_employee(&pool, payload.employee_id, "employee_id").await?;

    db::set_credit(
        &pool,
        payload.employee_id,
        payload.leave_type,
        payload.year,
        payload.allotted_days,
    )
    .await?;
    info!(
        "Employee {} granted {} {:?} day(s) for {}.",
        payload.employee_id, payload.allotted_days, payload.leave_type, payload.year
    );
    let balance =
        db::credit_balance(&pool, payload.employee_id, payload.leave_type, payload.year).await?;
    Ok(Json(balance))
}

/// Handler for granting this year's default credits to every active employee.
pub async fn rollover_credits(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    debug!("Received request to roll over leave credits.");
    let year = today().year();
    let created = db::rollover_credits_in_db(&state.pool, year, state.leave_defaults).await?;

    info!("Successfully rolled over {} leave credits for {}.", created, year);
    Ok(Json(serde_json::json!({
        "message": format!("Successfully rolled over {} leave credits for {}.", created, year),
        "year": year,
        "credits_created": created
    })))
}
