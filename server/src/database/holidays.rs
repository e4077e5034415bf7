// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::NaiveDate;
use common::{Holiday, HolidayPayload};
use sqlx::SqlitePool;

/// Holidays of one year, or all of them.
pub async fn list_holidays(pool: &SqlitePool, year: Option<i32>) -> Result<Vec<Holiday>> {
    let holidays = match year {
        Some(year) => {
            let start = NaiveDate::from_ymd_opt(year, 1, 1).context("Invalid year")?;
            let end = NaiveDate::from_ymd_opt(year, 12, 31).context("Invalid year")?;
            holidays_between(pool, start, end).await?
        }
        None => sqlx::query_as::<_, Holiday>("SELECT * FROM holidays ORDER BY holiday_date ASC")
            .fetch_all(pool)
            .await
            .context("Failed to retrieve holidays from DB")?,
    };
    Ok(holidays)
}

pub async fn holidays_between(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Holiday>> {
    sqlx::query_as::<_, Holiday>(
        "SELECT * FROM holidays WHERE holiday_date BETWEEN ? AND ? ORDER BY holiday_date ASC",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to retrieve holidays from {start} to {end}"))
}

pub async fn create_holiday(pool: &SqlitePool, payload: HolidayPayload) -> Result<Holiday> {
    let id = sqlx::query("INSERT INTO holidays (holiday_date, holiday_type, title) VALUES (?, ?, ?)")
        .bind(payload.holiday_date)
        .bind(payload.holiday_type)
        .bind(&payload.title)
        .execute(pool)
        .await
        .context("Failed to insert holiday into DB")?
        .last_insert_rowid();

    Ok(Holiday {
        id,
        holiday_date: payload.holiday_date,
        holiday_type: payload.holiday_type,
        title: payload.title,
    })
}

pub async fn delete_holiday(pool: &SqlitePool, holiday_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
        .bind(holiday_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete holiday with ID: {holiday_id}"))?;
    Ok(result.rows_affected() > 0)
}
