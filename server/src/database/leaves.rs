// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use common::leave::{self, LeaveSpan};
use common::{
    CreateLeavePayload, CreditBalance, LeaveDefaults, LeaveRequest, LeaveStatus, LeaveType,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Leave requests, newest first, optionally filtered by employee and status.
pub async fn list_leaves(
    pool: &SqlitePool,
    employee_id: Option<i64>,
    status: Option<LeaveStatus>,
) -> Result<Vec<LeaveRequest>> {
    let requests = sqlx::query_as::<_, LeaveRequest>(
        "SELECT * FROM leave_requests ORDER BY date_from DESC, id DESC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to retrieve leave requests from DB")?;

    Ok(requests
        .into_iter()
        .filter(|r| employee_id.is_none_or(|id| r.employee_id == id))
        .filter(|r| status.is_none_or(|s| r.status == s))
        .collect())
}

pub async fn get_leave(pool: &SqlitePool, leave_id: i64) -> Result<Option<LeaveRequest>> {
    sqlx::query_as::<_, LeaveRequest>("SELECT * FROM leave_requests WHERE id = ?")
        .bind(leave_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve leave request with ID: {leave_id}"))
}

/// Stores a new Pending request with its derived span.
pub async fn create_leave(
    pool: &SqlitePool,
    payload: &CreateLeavePayload,
    span: LeaveSpan,
) -> Result<LeaveRequest> {
    let created_at = Utc::now();
    let solo_parent = payload.leave_type == LeaveType::Maternity && payload.solo_parent;

    let id = sqlx::query(
        "INSERT INTO leave_requests (employee_id, leave_type, date_from, date_to, days, status, reason, solo_parent, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(payload.employee_id)
    .bind(payload.leave_type)
    .bind(span.date_from)
    .bind(span.date_to)
    .bind(span.days)
    .bind(LeaveStatus::Pending)
    .bind(&payload.reason)
    .bind(solo_parent)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert leave request into DB")?
    .last_insert_rowid();

    Ok(LeaveRequest {
        id,
        employee_id: payload.employee_id,
        leave_type: payload.leave_type,
        date_from: span.date_from,
        date_to: span.date_to,
        days: span.days,
        status: LeaveStatus::Pending,
        reason: payload.reason.clone(),
        solo_parent,
        created_at,
    })
}

/// Moves a request from `from` to `to`. Returns false if the request was no
/// longer in the `from` state, so concurrent decisions cannot both win.
pub async fn update_leave_status(
    pool: &SqlitePool,
    leave_id: i64,
    from: LeaveStatus,
    to: LeaveStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ? AND status = ?")
        .bind(to)
        .bind(leave_id)
        .bind(from)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update status of leave request {leave_id}"))?;
    debug!("Leave {} {:?} -> {:?}: {} row(s)", leave_id, from, to, result.rows_affected());
    Ok(result.rows_affected() > 0)
}

/// Approved requests overlapping `[start, end]`.
pub async fn approved_between(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<LeaveRequest>> {
    sqlx::query_as::<_, LeaveRequest>(
        "SELECT * FROM leave_requests WHERE status = ? AND date_from <= ? AND date_to >= ?",
    )
    .bind(LeaveStatus::Approved)
    .bind(end)
    .bind(start)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve approved leave for period")
}

// --- Credits ---

/// Remaining balance of one credit-based leave type. No allotment row means zero days.
pub async fn credit_balance(
    pool: &SqlitePool,
    employee_id: i64,
    leave_type: LeaveType,
    year: i32,
) -> Result<CreditBalance> {
    let allotted: Option<(i64,)> = sqlx::query_as(
        "SELECT allotted_days FROM leave_credits WHERE employee_id = ? AND leave_type = ? AND year = ?",
    )
    .bind(employee_id)
    .bind(leave_type)
    .bind(year)
    .fetch_optional(pool)
    .await
    .context("Failed to retrieve leave credit")?;

    let approved = sqlx::query_as::<_, LeaveRequest>(
        "SELECT * FROM leave_requests WHERE employee_id = ? AND leave_type = ? AND status = ?",
    )
    .bind(employee_id)
    .bind(leave_type)
    .bind(LeaveStatus::Approved)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve approved leave for credit check")?;

    let used = leave::used_days(&approved, leave_type, year);
    Ok(CreditBalance::new(
        leave_type,
        year,
        allotted.map_or(0, |(days,)| days),
        used,
    ))
}

/// Balances of every credit-based leave type for one employee and year.
pub async fn credit_balances(
    pool: &SqlitePool,
    employee_id: i64,
    year: i32,
) -> Result<Vec<CreditBalance>> {
    let mut balances = Vec::new();
    for leave_type in LeaveType::ALL.into_iter().filter(|t| t.uses_credits()) {
        balances.push(credit_balance(pool, employee_id, leave_type, year).await?);
    }
    Ok(balances)
}

pub async fn set_credit(
    pool: &SqlitePool,
    employee_id: i64,
    leave_type: LeaveType,
    year: i32,
    allotted_days: i64,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO leave_credits (employee_id, leave_type, year, allotted_days) VALUES (?, ?, ?, ?)
         ON CONFLICT (employee_id, leave_type, year) DO UPDATE SET allotted_days = excluded.allotted_days",
    )
    .bind(employee_id)
    .bind(leave_type)
    .bind(year)
    .bind(allotted_days)
    .execute(pool)
    .await
    .context("Failed to save leave credit")?;
    Ok(())
}

/// Grants the default allotments of `year` to every active employee that
/// does not have one yet. Returns the number of credit rows created.
pub async fn rollover_credits_in_db(
    pool: &SqlitePool,
    year: i32,
    defaults: LeaveDefaults,
) -> Result<u64> {
    let mut created = 0;
    for (leave_type, days) in defaults.allotments() {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO leave_credits (employee_id, leave_type, year, allotted_days)
             SELECT id, ?, ?, ? FROM employees WHERE deleted_at IS NULL",
        )
        .bind(leave_type)
        .bind(year)
        .bind(days)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to roll over {leave_type:?} credits for {year}"))?;
        created += result.rows_affected();
    }
    info!("Granted {} leave credit rows for {}.", created, year);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::employees::create_employee;
    use crate::database::test_support::setup_test_db;
    use common::EmployeePayload;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn vacation(employee_id: i64, from: NaiveDate, to: NaiveDate) -> (CreateLeavePayload, LeaveSpan) {
        let payload = CreateLeavePayload {
            employee_id,
            leave_type: LeaveType::Vacation,
            date_from: Some(from),
            date_to: Some(to),
            maternity_case: None,
            expected_delivery: None,
            event_date: None,
            solo_parent: false,
            solo_parent_id_uploaded: false,
            reason: Some("Family trip".to_string()),
        };
        let span = leave::compute_span(&payload).unwrap();
        (payload, span)
    }

    #[tokio::test]
    async fn test_status_update_only_from_expected_state() {
        let pool = setup_test_db().await.unwrap();
        let (payload, span) = vacation(1, date(2025, 3, 3), date(2025, 3, 5));
        let request = create_leave(&pool, &payload, span).await.unwrap();
        assert_eq!(request.days, 3);

        assert!(
            update_leave_status(&pool, request.id, LeaveStatus::Pending, LeaveStatus::Approved)
                .await
                .unwrap()
        );
        assert!(
            !update_leave_status(&pool, request.id, LeaveStatus::Pending, LeaveStatus::Declined)
                .await
                .unwrap()
        );
        let stored = get_leave(&pool, request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Approved);
    }

    #[tokio::test]
    async fn test_credit_balance_subtracts_approved_days() {
        let pool = setup_test_db().await.unwrap();
        set_credit(&pool, 1, LeaveType::Vacation, 2025, 10).await.unwrap();

        let (payload, span) = vacation(1, date(2025, 3, 3), date(2025, 3, 6));
        let approved = create_leave(&pool, &payload, span).await.unwrap();
        update_leave_status(&pool, approved.id, LeaveStatus::Pending, LeaveStatus::Approved)
            .await
            .unwrap();
        let (payload, span) = vacation(1, date(2025, 4, 7), date(2025, 4, 8));
        create_leave(&pool, &payload, span).await.unwrap();

        let balance = credit_balance(&pool, 1, LeaveType::Vacation, 2025).await.unwrap();
        assert_eq!(balance.used_days, 4);
        assert_eq!(balance.remaining_days, 6);

        let sick = credit_balance(&pool, 1, LeaveType::Sick, 2025).await.unwrap();
        assert_eq!(sick.allotted_days, 0);
        assert_eq!(credit_balances(&pool, 1, 2025).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rollover_keeps_existing_allotments() {
        let pool = setup_test_db().await.unwrap();
        for first in ["Ana", "Ben"] {
            create_employee(
                &pool,
                EmployeePayload {
                    first_name: first.to_string(),
                    last_name: "Test".to_string(),
                    joining_date: date(2024, 1, 1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        set_credit(&pool, 1, LeaveType::Vacation, 2026, 20).await.unwrap();

        let created = rollover_credits_in_db(&pool, 2026, LeaveDefaults::default())
            .await
            .unwrap();
        assert_eq!(created, 5);
        let again = rollover_credits_in_db(&pool, 2026, LeaveDefaults::default())
            .await
            .unwrap();
        assert_eq!(again, 0);

        let balance = credit_balance(&pool, 1, LeaveType::Vacation, 2026).await.unwrap();
        assert_eq!(balance.allotted_days, 20);
        let balance = credit_balance(&pool, 2, LeaveType::Emergency, 2026).await.unwrap();
        assert_eq!(balance.allotted_days, 5);
    }

    #[tokio::test]
    async fn test_approved_between_finds_overlaps() {
        let pool = setup_test_db().await.unwrap();
        let (payload, span) = vacation(1, date(2025, 5, 29), date(2025, 6, 3));
        let request = create_leave(&pool, &payload, span).await.unwrap();
        assert!(approved_between(&pool, date(2025, 6, 1), date(2025, 6, 30)).await.unwrap().is_empty());

        update_leave_status(&pool, request.id, LeaveStatus::Pending, LeaveStatus::Approved)
            .await
            .unwrap();
        let found = approved_between(&pool, date(2025, 6, 1), date(2025, 6, 30)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(list_leaves(&pool, Some(2), None).await.unwrap().is_empty());
        assert_eq!(list_leaves(&pool, Some(1), Some(LeaveStatus::Approved)).await.unwrap().len(), 1);
    }
}
