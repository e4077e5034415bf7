// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::Utc;
use common::payroll::PayrollEmployee;
use common::{Employee, EmployeePayload, Position, PositionPayload};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Active (not soft-deleted) employees, ordered by name.
pub async fn list_employees(pool: &SqlitePool) -> Result<Vec<Employee>> {
    let employees = sqlx::query_as::<_, Employee>(
        "SELECT * FROM employees WHERE deleted_at IS NULL ORDER BY last_name ASC, first_name ASC;",
    )
    .fetch_all(pool)
    .await
    .context("Failed to retrieve employees from DB")?;
    Ok(employees)
}

pub async fn get_employee(pool: &SqlitePool, employee_id: i64) -> Result<Option<Employee>> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ? AND deleted_at IS NULL")
        .bind(employee_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve employee with ID: {employee_id}"))
}

pub async fn employee_exists(pool: &SqlitePool, employee_id: i64) -> Result<bool> {
    Ok(get_employee(pool, employee_id).await?.is_some())
}

pub async fn create_employee(pool: &SqlitePool, payload: EmployeePayload) -> Result<Employee> {
    let created_at = Utc::now();
    debug!(
        "Insert employee: {} {}, position_id={:?}, joining_date={}",
        payload.first_name, payload.last_name, payload.position_id, payload.joining_date
    );

    let id = sqlx::query(
        "INSERT INTO employees (first_name, last_name, position_id, gender, joining_date, sss_number, philhealth_number, pagibig_number, tin, created_at, deleted_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(payload.position_id)
    .bind(&payload.gender)
    .bind(payload.joining_date)
    .bind(&payload.sss_number)
    .bind(&payload.philhealth_number)
    .bind(&payload.pagibig_number)
    .bind(&payload.tin)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert employee into DB")?
    .last_insert_rowid();

    Ok(Employee {
        id,
        first_name: payload.first_name,
        last_name: payload.last_name,
        position_id: payload.position_id,
        gender: payload.gender,
        joining_date: payload.joining_date,
        sss_number: payload.sss_number,
        philhealth_number: payload.philhealth_number,
        pagibig_number: payload.pagibig_number,
        tin: payload.tin,
        created_at,
        deleted_at: None,
    })
}

/// Replaces the editable fields of an active employee.
/// Returns `None` when no active employee has that ID.
pub async fn update_employee(
    pool: &SqlitePool,
    employee_id: i64,
    payload: EmployeePayload,
) -> Result<Option<Employee>> {
    let result = sqlx::query(
        "UPDATE employees SET first_name = ?, last_name = ?, position_id = ?, gender = ?, joining_date = ?, sss_number = ?, philhealth_number = ?, pagibig_number = ?, tin = ? WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(payload.position_id)
    .bind(&payload.gender)
    .bind(payload.joining_date)
    .bind(&payload.sss_number)
    .bind(&payload.philhealth_number)
    .bind(&payload.pagibig_number)
    .bind(&payload.tin)
    .bind(employee_id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update employee with ID: {employee_id}"))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_employee(pool, employee_id).await
}

/// Soft deletes an employee by setting its `deleted_at` timestamp.
/// Returns true if a row was updated, false if no active employee had that ID.
pub async fn soft_delete_employee(pool: &SqlitePool, employee_id: i64) -> Result<bool> {
    let result =
        sqlx::query("UPDATE employees SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(Utc::now())
            .bind(employee_id)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to soft delete employee with ID: {employee_id}"))?;

    let rows_affected = result.rows_affected();
    info!("Soft deleted {} rows for employee ID: {}", rows_affected, employee_id);
    Ok(rows_affected > 0)
}

/// Active employees with their monthly salary. Employees without a position earn nothing.
pub async fn payroll_employees(
    pool: &SqlitePool,
    only: Option<&[i64]>,
) -> Result<Vec<PayrollEmployee>> {
    let rows: Vec<(i64, String, String, f64)> = sqlx::query_as(
        "SELECT e.id, e.first_name, e.last_name, COALESCE(p.monthly_salary, 0.0)
         FROM employees e LEFT JOIN positions p ON p.id = e.position_id
         WHERE e.deleted_at IS NULL
         ORDER BY e.last_name ASC, e.first_name ASC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to retrieve payroll employees from DB")?;

    Ok(rows
        .into_iter()
        .filter(|(id, ..)| only.is_none_or(|ids| ids.contains(id)))
        .map(|(employee_id, first, last, monthly_salary)| PayrollEmployee {
            employee_id,
            name: format!("{first} {last}"),
            monthly_salary,
        })
        .collect())
}

// --- Positions ---

pub async fn list_positions(pool: &SqlitePool) -> Result<Vec<Position>> {
    sqlx::query_as::<_, Position>("SELECT * FROM positions ORDER BY title ASC")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve positions from DB")
}

pub async fn position_exists(pool: &SqlitePool, position_id: i64) -> Result<bool> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM positions WHERE id = ?")
        .bind(position_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to look up position with ID: {position_id}"))?;
    Ok(found.is_some())
}

pub async fn create_position(pool: &SqlitePool, payload: PositionPayload) -> Result<Position> {
    let id = sqlx::query("INSERT INTO positions (title, monthly_salary) VALUES (?, ?)")
        .bind(&payload.title)
        .bind(payload.monthly_salary)
        .execute(pool)
        .await
        .context("Failed to insert position into DB")?
        .last_insert_rowid();

    Ok(Position {
        id,
        title: payload.title,
        monthly_salary: payload.monthly_salary,
    })
}

pub async fn update_position(
    pool: &SqlitePool,
    position_id: i64,
    payload: PositionPayload,
) -> Result<Option<Position>> {
    let result = sqlx::query("UPDATE positions SET title = ?, monthly_salary = ? WHERE id = ?")
        .bind(&payload.title)
        .bind(payload.monthly_salary)
        .bind(position_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update position with ID: {position_id}"))?;

    Ok((result.rows_affected() > 0).then(|| Position {
        id: position_id,
        title: payload.title,
        monthly_salary: payload.monthly_salary,
    }))
}

/// Number of active employees holding the position.
pub async fn count_position_holders(pool: &SqlitePool, position_id: i64) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM employees WHERE position_id = ? AND deleted_at IS NULL",
    )
    .bind(position_id)
    .fetch_one(pool)
    .await
    .context("Failed to count position holders")?;
    Ok(count)
}

pub async fn delete_position(pool: &SqlitePool, position_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM positions WHERE id = ?")
        .bind(position_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete position with ID: {position_id}"))?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::setup_test_db;
    use chrono::NaiveDate;

    fn payload(first: &str, last: &str, position_id: Option<i64>) -> EmployeePayload {
        EmployeePayload {
            first_name: first.to_string(),
            last_name: last.to_string(),
            position_id,
            joining_date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_update_and_soft_delete_employee() {
        let pool = setup_test_db().await.unwrap();
        let created = create_employee(&pool, payload("Ana", "Reyes", None)).await.unwrap();
        assert!(created.id > 0);

        let mut changed = payload("Ana", "Santos", None);
        changed.tin = Some("123-456-789".to_string());
        let updated = update_employee(&pool, created.id, changed).await.unwrap().unwrap();
        assert_eq!(updated.last_name, "Santos");
        assert_eq!(updated.tin.as_deref(), Some("123-456-789"));

        assert!(soft_delete_employee(&pool, created.id).await.unwrap());
        assert!(!soft_delete_employee(&pool, created.id).await.unwrap());
        assert!(list_employees(&pool).await.unwrap().is_empty());
        assert!(update_employee(&pool, created.id, payload("A", "B", None)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_payroll_employees_join_salary() {
        let pool = setup_test_db().await.unwrap();
        let clerk = create_position(
            &pool,
            PositionPayload {
                title: "Clerk".to_string(),
                monthly_salary: 22000.0,
            },
        )
        .await
        .unwrap();
        let ana = create_employee(&pool, payload("Ana", "Reyes", Some(clerk.id))).await.unwrap();
        let ben = create_employee(&pool, payload("Ben", "Cruz", None)).await.unwrap();

        let all = payroll_employees(&pool, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Ben Cruz");
        assert_eq!(all[0].monthly_salary, 0.0);
        assert_eq!(all[1].monthly_salary, 22000.0);

        let only = payroll_employees(&pool, Some(&[ana.id])).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].employee_id, ana.id);
        assert_ne!(only[0].employee_id, ben.id);

        assert_eq!(count_position_holders(&pool, clerk.id).await.unwrap(), 1);
    }
}
