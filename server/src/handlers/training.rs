// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::{AppError, ensure_employee};
use crate::database::training as db;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use common::{EnrollPayload, TrainingPayload, TrainingProgram};
use sqlx::SqlitePool;
use tracing::info;

async fn ensure_participants(pool: &SqlitePool, field: &str, employee_ids: &[i64]) -> Result<(), AppError> {
    for &employee_id in employee_ids {
        ensure_employee(pool, employee_id, field).await?;
    }
    Ok(())
}

pub async fn list_trainings(
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<TrainingProgram>>, AppError> {
    Ok(Json(db::list_trainings(&pool).await?))
}

pub async fn get_training(
    State(pool): State<SqlitePool>,
    Path(training_id): Path<i64>,
) -> Result<Json<TrainingProgram>, AppError> {
    db::get_training(&pool, training_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Training program", training_id))
}

pub async fn create_training(
    State(pool): State<SqlitePool>,
    Json(payload): Json<TrainingPayload>,
) -> Result<(StatusCode, Json<TrainingProgram>), AppError> {
    payload.validate()?;
    ensure_participants(&pool, "participants", &payload.participants).await?;

    let program = db::create_training(&pool, payload).await?;
    info!(
        "Training '{}' created with {} participant(s).",
        program.title,
        program.participants.len()
    );
    Ok((StatusCode::CREATED, Json(program)))
}

/// Handler for adding participants. Employees already enrolled are kept once.
pub async fn enroll(
    State(pool): State<SqlitePool>,
    Path(training_id): Path<i64>,
    Json(payload): Json<EnrollPayload>,
) -> Result<Json<TrainingProgram>, AppError> {
    if db::get_training(&pool, training_id).await?.is_none() {
        return Err(AppError::not_found("Training program", training_id));
    }
    ensure_participants(&pool, "employee_ids", &payload.employee_ids).await?;

    db::enroll(&pool, training_id, &payload.employee_ids).await?;
    db::get_training(&pool, training_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Training program", training_id))
}

pub async fn delete_training(
    State(pool): State<SqlitePool>,
    Path(training_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if db::delete_training(&pool, training_id).await? {
        info!("Training with ID {} deleted.", training_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Training program", training_id))
    }
}
