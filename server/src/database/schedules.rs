// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use common::payroll::Shift;
use common::{Schedule, ScheduleAssignment, ScheduleDetail, ScheduleTemplate, TemplatePayload};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// An assignment row whose template (if any) has already been resolved to times.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub employee_id: i64,
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
}

/// One scheduled shift joined with the employee's name, for the attendance view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShiftRow {
    pub employee_id: i64,
    pub employee_name: String,
    pub schedule_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

async fn assignments_of(pool: &SqlitePool, schedule_id: i64) -> Result<Vec<ScheduleAssignment>> {
    sqlx::query_as::<_, ScheduleAssignment>(
        "SELECT * FROM schedule_assignments WHERE schedule_id = ? ORDER BY id ASC",
    )
    .bind(schedule_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to retrieve assignments of schedule {schedule_id}"))
}

/// Schedules with their assignments, optionally restricted to one date.
pub async fn list_schedules(
    pool: &SqlitePool,
    date: Option<NaiveDate>,
) -> Result<Vec<ScheduleDetail>> {
    let schedules = match date {
        Some(date) => {
            sqlx::query_as::<_, Schedule>(
                "SELECT * FROM schedules WHERE schedule_date = ? ORDER BY id ASC",
            )
            .bind(date)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Schedule>(
                "SELECT * FROM schedules ORDER BY schedule_date DESC, id ASC",
            )
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to retrieve schedules from DB")?;

    let mut details = Vec::with_capacity(schedules.len());
    for schedule in schedules {
        let assignments = assignments_of(pool, schedule.id).await?;
        details.push(ScheduleDetail {
            schedule,
            assignments,
        });
    }
    Ok(details)
}

pub async fn get_schedule(pool: &SqlitePool, schedule_id: i64) -> Result<Option<ScheduleDetail>> {
    let schedule = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = ?")
        .bind(schedule_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve schedule with ID: {schedule_id}"))?;

    match schedule {
        Some(schedule) => {
            let assignments = assignments_of(pool, schedule.id).await?;
            Ok(Some(ScheduleDetail {
                schedule,
                assignments,
            }))
        }
        None => Ok(None),
    }
}

/// Employees among `employee_ids` that already have a shift on `date`.
pub async fn employees_scheduled_on(
    pool: &SqlitePool,
    date: NaiveDate,
    employee_ids: &[i64],
) -> Result<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT a.employee_id FROM schedule_assignments a
         JOIN schedules s ON s.id = a.schedule_id
         WHERE s.schedule_date = ?",
    )
    .bind(date)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve scheduled employees")?;

    Ok(rows
        .into_iter()
        .map(|(id,)| id)
        .filter(|id| employee_ids.contains(id))
        .collect())
}

/// Inserts a schedule and its whole grid in one transaction.
pub async fn create_schedule(
    pool: &SqlitePool,
    schedule_date: NaiveDate,
    notes: Option<String>,
    rows: Vec<NewAssignment>,
) -> Result<ScheduleDetail> {
    let created_at = Utc::now();
    let mut tx = pool.begin().await.context("Failed to open transaction")?;

    let schedule_id =
        sqlx::query("INSERT INTO schedules (schedule_date, notes, created_at) VALUES (?, ?, ?)")
            .bind(schedule_date)
            .bind(&notes)
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .context("Failed to insert schedule into DB")?
            .last_insert_rowid();

    let mut assignments = Vec::with_capacity(rows.len());
    for row in rows {
        debug!(
            "Assigning employee {} to {} ({}-{})",
            row.employee_id, schedule_date, row.start_time, row.end_time
        );
        let id = sqlx::query(
            "INSERT INTO schedule_assignments (schedule_id, employee_id, start_time, end_time, notes) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(schedule_id)
        .bind(row.employee_id)
        .bind(&row.start_time)
        .bind(&row.end_time)
        .bind(&row.notes)
        .execute(&mut *tx)
        .await
        .context("Failed to insert schedule assignment into DB")?
        .last_insert_rowid();

        assignments.push(ScheduleAssignment {
            id,
            schedule_id,
            employee_id: row.employee_id,
            start_time: row.start_time,
            end_time: row.end_time,
            notes: row.notes,
        });
    }

    tx.commit().await.context("Failed to commit schedule")?;
    info!(
        "Schedule {} created for {} with {} assignments.",
        schedule_id,
        schedule_date,
        assignments.len()
    );

    Ok(ScheduleDetail {
        schedule: Schedule {
            id: schedule_id,
            schedule_date,
            notes,
            created_at,
        },
        assignments,
    })
}

pub async fn delete_schedule(pool: &SqlitePool, schedule_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to open transaction")?;
    sqlx::query("DELETE FROM schedule_assignments WHERE schedule_id = ?")
        .bind(schedule_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete schedule assignments")?;
    let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
        .bind(schedule_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to delete schedule with ID: {schedule_id}"))?;
    tx.commit().await.context("Failed to commit schedule deletion")?;
    Ok(result.rows_affected() > 0)
}

/// Shifts of active employees on `date`, ordered by employee name.
pub async fn shifts_on(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<ShiftRow>> {
    sqlx::query_as::<_, ShiftRow>(
        "SELECT a.employee_id, e.first_name || ' ' || e.last_name AS employee_name,
                s.schedule_date, a.start_time, a.end_time
         FROM schedule_assignments a
         JOIN schedules s ON s.id = a.schedule_id
         JOIN employees e ON e.id = a.employee_id
         WHERE s.schedule_date = ? AND e.deleted_at IS NULL
         ORDER BY employee_name ASC",
    )
    .bind(date)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to retrieve shifts on {date}"))
}

/// Shift start times in `[start, end]`, the schedule input of a payroll run.
pub async fn shifts_between(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Shift>> {
    sqlx::query_as::<_, Shift>(
        "SELECT a.employee_id, s.schedule_date, a.start_time
         FROM schedule_assignments a
         JOIN schedules s ON s.id = a.schedule_id
         WHERE s.schedule_date BETWEEN ? AND ?",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve shifts for payroll")
}

// --- Templates ---

pub async fn list_templates(pool: &SqlitePool) -> Result<Vec<ScheduleTemplate>> {
    sqlx::query_as::<_, ScheduleTemplate>("SELECT * FROM schedule_templates ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve schedule templates from DB")
}

pub async fn get_template(pool: &SqlitePool, template_id: i64) -> Result<Option<ScheduleTemplate>> {
    sqlx::query_as::<_, ScheduleTemplate>("SELECT * FROM schedule_templates WHERE id = ?")
        .bind(template_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve template with ID: {template_id}"))
}

/// Inserts a template. Times must already be normalized to `HH:MM`.
pub async fn create_template(pool: &SqlitePool, payload: TemplatePayload) -> Result<ScheduleTemplate> {
    let id = sqlx::query(
        "INSERT INTO schedule_templates (name, start_time, end_time) VALUES (?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(&payload.start_time)
    .bind(&payload.end_time)
    .execute(pool)
    .await
    .context("Failed to insert schedule template into DB")?
    .last_insert_rowid();

    Ok(ScheduleTemplate {
        id,
        name: payload.name,
        start_time: payload.start_time,
        end_time: payload.end_time,
    })
}

pub async fn delete_template(pool: &SqlitePool, template_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM schedule_templates WHERE id = ?")
        .bind(template_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete template with ID: {template_id}"))?;
    Ok(result.rows_affected() > 0)
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

    fn row(employee_id: i64) -> NewAssignment {
        NewAssignment {
            employee_id,
            start_time: "09:00".to_string(),
            end_time: "18:00".to_string(),
            notes: None,
        }
    }

    async fn employee(pool: &SqlitePool, first: &str) -> i64 {
        create_employee(
            pool,
            EmployeePayload {
                first_name: first.to_string(),
                last_name: "Test".to_string(),
                joining_date: date(2024, 1, 1),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_create_and_fetch_schedule_grid() {
        let pool = setup_test_db().await.unwrap();
        let a = employee(&pool, "Ana").await;
        let b = employee(&pool, "Ben").await;
        let day = date(2025, 6, 2);

        let created = create_schedule(&pool, day, Some("Week 23".into()), vec![row(a), row(b)])
            .await
            .unwrap();
        assert_eq!(created.assignments.len(), 2);

        let fetched = get_schedule(&pool, created.schedule.id).await.unwrap().unwrap();
        assert_eq!(fetched.schedule.schedule_date, day);
        assert_eq!(fetched.schedule.notes.as_deref(), Some("Week 23"));
        assert_eq!(fetched.assignments, created.assignments);

        let shifts = shifts_on(&pool, day).await.unwrap();
        assert_eq!(shifts.len(), 2);
        assert_eq!(shifts[0].employee_name, "Ana Test");

        assert_eq!(employees_scheduled_on(&pool, day, &[b, 99]).await.unwrap(), vec![b]);
        assert_eq!(shifts_between(&pool, day, day).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_employee_in_grid_rolls_back() {
        let pool = setup_test_db().await.unwrap();
        let a = employee(&pool, "Ana").await;
        let err = create_schedule(&pool, date(2025, 6, 2), None, vec![row(a), row(a)])
            .await
            .unwrap_err();
        assert!(crate::database::is_unique_violation(&err));
        assert!(list_schedules(&pool, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_schedule_removes_assignments() {
        let pool = setup_test_db().await.unwrap();
        let a = employee(&pool, "Ana").await;
        let day = date(2025, 6, 3);
        let created = create_schedule(&pool, day, None, vec![row(a)]).await.unwrap();

        assert!(delete_schedule(&pool, created.schedule.id).await.unwrap());
        assert!(shifts_on(&pool, day).await.unwrap().is_empty());
        assert!(!delete_schedule(&pool, created.schedule.id).await.unwrap());
    }
}
