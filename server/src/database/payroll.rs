// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use common::payroll::{AdjustmentsPayload, PayrollComputation, PayrollRecord, PayrollStatus};
use serde::Serialize;
use sqlx::SqlitePool;
use sqlx::types::Json;
use tracing::{debug, info};

/// Outcome of storing a payroll run.
#[derive(Debug, Default, Serialize)]
pub struct SavedPayroll {
    pub records: Vec<PayrollRecord>,
    /// Employees whose record for the period was already paid and left untouched.
    pub skipped_paid: Vec<i64>,
}

pub async fn list_payroll(
    pool: &SqlitePool,
    period: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<PayrollRecord>> {
    let records = match period {
        Some((start, end)) => {
            sqlx::query_as::<_, PayrollRecord>(
                "SELECT * FROM payroll_records WHERE period_start = ? AND period_end = ? ORDER BY employee_id ASC",
            )
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, PayrollRecord>(
                "SELECT * FROM payroll_records ORDER BY period_start DESC, employee_id ASC",
            )
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to retrieve payroll records from DB")?;
    Ok(records)
}

pub async fn get_payroll(pool: &SqlitePool, payroll_id: i64) -> Result<Option<PayrollRecord>> {
    sqlx::query_as::<_, PayrollRecord>("SELECT * FROM payroll_records WHERE id = ?")
        .bind(payroll_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve payroll record with ID: {payroll_id}"))
}

/// Stores a payroll run. A Pending record for the same employee and period
/// is refreshed with the new gross figures while keeping its adjustments;
/// a Paid record is left as it is.
pub async fn save_generated(
    pool: &SqlitePool,
    computations: &[PayrollComputation],
) -> Result<SavedPayroll> {
    let mut tx = pool.begin().await.context("Failed to open transaction")?;
    let mut saved = SavedPayroll::default();

    for c in computations {
        let existing = sqlx::query_as::<_, PayrollRecord>(
            "SELECT * FROM payroll_records WHERE employee_id = ? AND period_start = ? AND period_end = ?",
        )
        .bind(c.employee_id)
        .bind(c.period_start)
        .bind(c.period_end)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to look up existing payroll record")?;

        let id = match existing {
            Some(record) if record.status == PayrollStatus::Paid => {
                debug!("Payroll {} already paid, skipping employee {}", record.id, c.employee_id);
                saved.skipped_paid.push(c.employee_id);
                continue;
            }
            Some(record) => {
                let adjustments = AdjustmentsPayload {
                    allowances: record.allowances,
                    bonuses: record.bonuses,
                    loan_repayment: record.loan_repayment,
                    deductions: record.deductions.0.clone(),
                };
                sqlx::query(
                    "UPDATE payroll_records SET base_pay = ?, holiday_pay = ?, leave_pay = ?, total_gross = ?, earnings = ?, net_pay = ? WHERE id = ?",
                )
                .bind(c.base_pay)
                .bind(c.holiday_pay)
                .bind(c.leave_pay)
                .bind(c.total_gross)
                .bind(Json(&c.earnings))
                .bind(adjustments.net_pay(c.total_gross))
                .bind(record.id)
                .execute(&mut *tx)
                .await
                .context("Failed to refresh payroll record")?;
                record.id
            }
            None => sqlx::query(
                "INSERT INTO payroll_records (employee_id, period_start, period_end, base_pay, holiday_pay, leave_pay, total_gross, earnings, deductions, allowances, bonuses, loan_repayment, net_pay, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, '{}', 0, 0, 0, ?, ?, ?)",
            )
            .bind(c.employee_id)
            .bind(c.period_start)
            .bind(c.period_end)
            .bind(c.base_pay)
            .bind(c.holiday_pay)
            .bind(c.leave_pay)
            .bind(c.total_gross)
            .bind(Json(&c.earnings))
            .bind(c.total_gross)
            .bind(PayrollStatus::Pending)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .context("Failed to insert payroll record")?
            .last_insert_rowid(),
        };

        let record = sqlx::query_as::<_, PayrollRecord>("SELECT * FROM payroll_records WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to read back payroll record")?;
        saved.records.push(record);
    }

    tx.commit().await.context("Failed to commit payroll run")?;
    info!(
        "Saved {} payroll records ({} already paid).",
        saved.records.len(),
        saved.skipped_paid.len()
    );
    Ok(saved)
}

/// Replaces the adjustments of a Pending record and recomputes its net pay.
/// Returns `None` when the record does not exist or is no longer Pending.
pub async fn update_adjustments(
    pool: &SqlitePool,
    payroll_id: i64,
    adjustments: &AdjustmentsPayload,
) -> Result<Option<PayrollRecord>> {
    let Some(record) = get_payroll(pool, payroll_id).await? else {
        return Ok(None);
    };

    let result = sqlx::query(
        "UPDATE payroll_records SET allowances = ?, bonuses = ?, loan_repayment = ?, deductions = ?, net_pay = ? WHERE id = ? AND status = ?",
    )
    .bind(adjustments.allowances)
    .bind(adjustments.bonuses)
    .bind(adjustments.loan_repayment)
    .bind(Json(&adjustments.deductions))
    .bind(adjustments.net_pay(record.total_gross))
    .bind(payroll_id)
    .bind(PayrollStatus::Pending)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update adjustments of payroll record {payroll_id}"))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_payroll(pool, payroll_id).await
}

/// Marks a Pending record as Paid. Returns false if it was not Pending.
pub async fn mark_paid(pool: &SqlitePool, payroll_id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE payroll_records SET status = ? WHERE id = ? AND status = ?")
        .bind(PayrollStatus::Paid)
        .bind(payroll_id)
        .bind(PayrollStatus::Pending)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to mark payroll record {payroll_id} as paid"))?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::setup_test_db;
    use common::payroll::Earning;

    fn computation(employee_id: i64, gross: f64) -> PayrollComputation {
        PayrollComputation {
            employee_id,
            employee_name: "Ana Reyes".to_string(),
            period_start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            daily_rate: 1000.0,
            days: Vec::new(),
            days_worked: 0,
            leave_days: 0,
            absences: 0,
            base_pay: gross,
            holiday_pay: 0.0,
            leave_pay: 0.0,
            total_gross: gross,
            earnings: vec![Earning {
                label: "Basic Pay".to_string(),
                amount: gross,
            }],
        }
    }

    #[tokio::test]
    async fn test_regeneration_keeps_adjustments_and_skips_paid() {
        let pool = setup_test_db().await.unwrap();
        let first = save_generated(&pool, &[computation(1, 10000.0), computation(2, 8000.0)])
            .await
            .unwrap();
        assert_eq!(first.records.len(), 2);
        assert_eq!(first.records[0].net_pay, 10000.0);
        assert_eq!(first.records[0].status, PayrollStatus::Pending);

        let mut adjustments = AdjustmentsPayload {
            allowances: 1000.0,
            ..Default::default()
        };
        adjustments.deductions.insert("SSS".to_string(), 500.0);
        let adjusted = update_adjustments(&pool, first.records[0].id, &adjustments)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(adjusted.net_pay, 10500.0);
        assert_eq!(adjusted.deductions.0["SSS"], 500.0);

        assert!(mark_paid(&pool, first.records[1].id).await.unwrap());
        assert!(!mark_paid(&pool, first.records[1].id).await.unwrap());

        let second = save_generated(&pool, &[computation(1, 12000.0), computation(2, 9000.0)])
            .await
            .unwrap();
        assert_eq!(second.skipped_paid, vec![2]);
        assert_eq!(second.records.len(), 1);
        assert_eq!(second.records[0].id, first.records[0].id);
        assert_eq!(second.records[0].total_gross, 12000.0);
        assert_eq!(second.records[0].net_pay, 12500.0);

        let paid = get_payroll(&pool, first.records[1].id).await.unwrap().unwrap();
        assert_eq!(paid.total_gross, 8000.0);
        assert!(update_adjustments(&pool, paid.id, &adjustments).await.unwrap().is_none());
    }
}
