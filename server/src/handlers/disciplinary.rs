// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::{AppError, ensure_employee, today};
use crate::database::disciplinary as db;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use common::{CasePayload, CaseStatusPayload, DisciplinaryCase};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CaseFilter {
    pub employee_id: Option<i64>,
}

pub async fn list_cases(
    State(pool): State<SqlitePool>,
    Query(filter): Query<CaseFilter>,
) -> Result<Json<Vec<DisciplinaryCase>>, AppError> {
    Ok(Json(db::list_cases(&pool, filter.employee_id).await?))
}

pub async fn create_case(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CasePayload>,
) -> Result<(StatusCode, Json<DisciplinaryCase>), AppError> {
    payload.validate(today())?;
    ensure_employee(&pool, payload.employee_id, "employee_id").await?;

    let case = db::create_case(&pool, payload).await?;
    info!("Disciplinary case {} opened for employee {}.", case.id, case.employee_id);
    Ok((StatusCode::CREATED, Json(case)))
}

/// Handler for resolving or dismissing an open case.
pub async fn update_case_status(
    State(pool): State<SqlitePool>,
    Path(case_id): Path<i64>,
    Json(payload): Json<CaseStatusPayload>,
) -> Result<Json<DisciplinaryCase>, AppError> {
    let case = db::get_case(&pool, case_id)
        .await?
        .ok_or_else(|| AppError::not_found("Disciplinary case", case_id))?;

    let conflict = || {
        AppError::conflict(&format!(
            "Case {} is {:?} and cannot become {:?}.",
            case_id, case.status, payload.status
        ))
    };
    if !case.status.can_transition_to(payload.status) {
        return Err(conflict());
    }
    if !db::close_case(&pool, case_id, payload.status, payload.action_taken.as_deref()).await? {
        return Err(conflict());
    }

    info!("Disciplinary case {} is now {:?}.", case_id, payload.status);
    Ok(Json(DisciplinaryCase {
        status: payload.status,
        action_taken: payload.action_taken,
        ..case
    }))
}
