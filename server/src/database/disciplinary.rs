// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::Utc;
use common::{CasePayload, CaseStatus, DisciplinaryCase};
use sqlx::SqlitePool;

pub async fn list_cases(pool: &SqlitePool, employee_id: Option<i64>) -> Result<Vec<DisciplinaryCase>> {
    let cases = match employee_id {
        Some(id) => {
            sqlx::query_as::<_, DisciplinaryCase>(
                "SELECT * FROM disciplinary_cases WHERE employee_id = ? ORDER BY incident_date DESC, id DESC",
            )
            .bind(id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, DisciplinaryCase>(
                "SELECT * FROM disciplinary_cases ORDER BY incident_date DESC, id DESC",
            )
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to retrieve disciplinary cases from DB")?;
    Ok(cases)
}

pub async fn get_case(pool: &SqlitePool, case_id: i64) -> Result<Option<DisciplinaryCase>> {
    sqlx::query_as::<_, DisciplinaryCase>("SELECT * FROM disciplinary_cases WHERE id = ?")
        .bind(case_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve disciplinary case with ID: {case_id}"))
}

pub async fn create_case(pool: &SqlitePool, payload: CasePayload) -> Result<DisciplinaryCase> {
    let created_at = Utc::now();
    let id = sqlx::query(
        "INSERT INTO disciplinary_cases (employee_id, violation, description, incident_date, action_taken, status, created_at) VALUES (?, ?, ?, ?, NULL, ?, ?)",
    )
    .bind(payload.employee_id)
    .bind(&payload.violation)
    .bind(&payload.description)
    .bind(payload.incident_date)
    .bind(CaseStatus::Open)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert disciplinary case into DB")?
    .last_insert_rowid();

    Ok(DisciplinaryCase {
        id,
        employee_id: payload.employee_id,
        violation: payload.violation,
        description: payload.description,
        incident_date: payload.incident_date,
        action_taken: None,
        status: CaseStatus::Open,
        created_at,
    })
}

/// Closes an Open case. Returns false if the case was not Open.
pub async fn close_case(
    pool: &SqlitePool,
    case_id: i64,
    status: CaseStatus,
    action_taken: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE disciplinary_cases SET status = ?, action_taken = ? WHERE id = ? AND status = ?",
    )
    .bind(status)
    .bind(action_taken)
    .bind(case_id)
    .bind(CaseStatus::Open)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update disciplinary case {case_id}"))?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::setup_test_db;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_case_closes_once() {
        let pool = setup_test_db().await.unwrap();
        let case = create_case(
            &pool,
            CasePayload {
                employee_id: 4,
                violation: "Tardiness".to_string(),
                description: Some("Late five times in May".to_string()),
                incident_date: NaiveDate::from_ymd_opt(2025, 5, 30).unwrap(),
            },
        )
        .await
        .unwrap();

        assert!(close_case(&pool, case.id, CaseStatus::Resolved, Some("Written warning")).await.unwrap());
        assert!(!close_case(&pool, case.id, CaseStatus::Dismissed, None).await.unwrap());

        let stored = get_case(&pool, case.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CaseStatus::Resolved);
        assert_eq!(stored.action_taken.as_deref(), Some("Written warning"));
        assert_eq!(list_cases(&pool, Some(4)).await.unwrap().len(), 1);
        assert!(list_cases(&pool, Some(5)).await.unwrap().is_empty());
    }
}
