// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::Utc;
use common::{TrainingPayload, TrainingProgram};
use sqlx::SqlitePool;

async fn participants_of(pool: &SqlitePool, training_id: i64) -> Result<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT employee_id FROM training_participants WHERE training_id = ? ORDER BY employee_id ASC",
    )
    .bind(training_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to retrieve participants of training {training_id}"))?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn list_trainings(pool: &SqlitePool) -> Result<Vec<TrainingProgram>> {
    let mut programs = sqlx::query_as::<_, TrainingProgram>(
        "SELECT * FROM training_programs ORDER BY start_date DESC, id DESC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to retrieve training programs from DB")?;

    for program in &mut programs {
        program.participants = participants_of(pool, program.id).await?;
    }
    Ok(programs)
}

pub async fn get_training(pool: &SqlitePool, training_id: i64) -> Result<Option<TrainingProgram>> {
    let program = sqlx::query_as::<_, TrainingProgram>("SELECT * FROM training_programs WHERE id = ?")
        .bind(training_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve training with ID: {training_id}"))?;

    match program {
        Some(mut program) => {
            program.participants = participants_of(pool, training_id).await?;
            Ok(Some(program))
        }
        None => Ok(None),
    }
}

pub async fn create_training(pool: &SqlitePool, payload: TrainingPayload) -> Result<TrainingProgram> {
    let created_at = Utc::now();
    let id = sqlx::query(
        "INSERT INTO training_programs (title, description, start_date, end_date, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert training program into DB")?
    .last_insert_rowid();

    enroll(pool, id, &payload.participants).await?;
    Ok(TrainingProgram {
        id,
        title: payload.title,
        description: payload.description,
        start_date: payload.start_date,
        end_date: payload.end_date,
        created_at,
        participants: participants_of(pool, id).await?,
    })
}

/// Adds participants, ignoring employees already enrolled.
pub async fn enroll(pool: &SqlitePool, training_id: i64, employee_ids: &[i64]) -> Result<()> {
    for &employee_id in employee_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO training_participants (training_id, employee_id) VALUES (?, ?)",
        )
        .bind(training_id)
        .bind(employee_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to enroll employee {employee_id} in training {training_id}"))?;
    }
    Ok(())
}

pub async fn delete_training(pool: &SqlitePool, training_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to open transaction")?;
    sqlx::query("DELETE FROM training_participants WHERE training_id = ?")
        .bind(training_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete training participants")?;
    let result = sqlx::query("DELETE FROM training_programs WHERE id = ?")
        .bind(training_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to delete training with ID: {training_id}"))?;
    tx.commit().await.context("Failed to commit training deletion")?;
    Ok(result.rows_affected() > 0)
}
