// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::{AppError, ensure_employee};
use crate::database::schedules::{self as db, NewAssignment};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use common::time;
use common::{CreateSchedulePayload, ScheduleDetail, ScheduleTemplate, TemplatePayload, ValidationErrors};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

pub async fn list_schedules(
    State(pool): State<SqlitePool>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<ScheduleDetail>>, AppError> {
    let schedules = db::list_schedules(&pool, query.date).await?;
    info!("Successfully retrieved {} schedules.", schedules.len());
    Ok(Json(schedules))
}

pub async fn get_schedule(
    State(pool): State<SqlitePool>,
    Path(schedule_id): Path<i64>,
) -> Result<Json<ScheduleDetail>, AppError> {
    db::get_schedule(&pool, schedule_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Schedule", schedule_id))
}

/// Handler for saving a schedule grid.
///
/// Template rows take the template's times unless explicit times are given.
/// An employee may hold only one shift per date, across all schedules.
pub async fn create_schedule(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateSchedulePayload>,
) -> Result<(StatusCode, Json<ScheduleDetail>), AppError> {
    debug!(
        "Received schedule for {} with {} rows",
        payload.schedule_date,
        payload.assignments.len()
    );
    payload.validate()?;

    let mut rows = Vec::with_capacity(payload.assignments.len());
    for (i, row) in payload.assignments.iter().enumerate() {
        ensure_employee(&pool, row.employee_id, &format!("assignments[{i}].employee_id")).await?;

        let template = match row.template_id {
            Some(template_id) => Some(db::get_template(&pool, template_id).await?.ok_or_else(|| {
                ValidationErrors::single(
                    &format!("assignments[{i}].template_id"),
                    format!("Template {template_id} does not exist."),
                )
            })?),
            None => None,
        };

        // Validation guarantees either explicit times or a template.
        let pick = |explicit: &Option<String>, from_template: Option<&str>| -> Result<String, AppError> {
            let raw = explicit.as_deref().or(from_template).unwrap_or_default();
            Ok(time::normalize(raw)?)
        };
        rows.push(NewAssignment {
            employee_id: row.employee_id,
            start_time: pick(&row.start_time, template.as_ref().map(|t| t.start_time.as_str()))?,
            end_time: pick(&row.end_time, template.as_ref().map(|t| t.end_time.as_str()))?,
            notes: row.notes.clone(),
        });
    }

    let employee_ids: Vec<i64> = rows.iter().map(|r| r.employee_id).collect();
    let taken = db::employees_scheduled_on(&pool, payload.schedule_date, &employee_ids).await?;
    if !taken.is_empty() {
        let mut errors = ValidationErrors::new();
        for (i, row) in rows.iter().enumerate() {
            if taken.contains(&row.employee_id) {
                errors.add(
                    &format!("assignments[{i}].employee_id"),
                    format!(
                        "Employee {} already has a shift on {}.",
                        row.employee_id, payload.schedule_date
                    ),
                );
            }
        }
        return Err(errors.into());
    }

    let schedule = db::create_schedule(&pool, payload.schedule_date, payload.notes, rows)
        .await
        .map_err(|e| {
            AppError::duplicate_or_internal(e, "assignments", "An employee appears twice in this schedule.")
        })?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn delete_schedule(
    State(pool): State<SqlitePool>,
    Path(schedule_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if db::delete_schedule(&pool, schedule_id).await? {
        info!("Schedule with ID {} deleted.", schedule_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Schedule", schedule_id))
    }
}

// --- Templates ---

pub async fn list_templates(
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<ScheduleTemplate>>, AppError> {
    Ok(Json(db::list_templates(&pool).await?))
}

pub async fn create_template(
    State(pool): State<SqlitePool>,
    Json(mut payload): Json<TemplatePayload>,
) -> Result<(StatusCode, Json<ScheduleTemplate>), AppError> {
    payload.validate()?;
    payload.start_time = time::normalize(&payload.start_time)?;
    payload.end_time = time::normalize(&payload.end_time)?;

    let name = payload.name.clone();
    let template = db::create_template(&pool, payload).await.map_err(|e| {
        AppError::duplicate_or_internal(e, "name", &format!("A template named '{name}' already exists."))
    })?;
    info!("Template '{}' created with ID: {}", template.name, template.id);
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn delete_template(
    State(pool): State<SqlitePool>,
    Path(template_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if db::delete_template(&pool, template_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Template", template_id))
    }
}
