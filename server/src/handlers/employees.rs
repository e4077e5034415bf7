// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::AppError;
use crate::database::employees as db;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use common::{Employee, EmployeePayload, Position, PositionPayload, ValidationErrors};
use sqlx::SqlitePool;
use tracing::{debug, info};

async fn check_position(pool: &SqlitePool, payload: &EmployeePayload) -> Result<(), AppError> {
    if let Some(position_id) = payload.position_id {
        if !db::position_exists(pool, position_id).await? {
            return Err(ValidationErrors::single(
                "position_id",
                format!("Position {position_id} does not exist."),
            )
            .into());
        }
    }
    Ok(())
}

/// Handler for listing active employees.
pub async fn list_employees(State(pool): State<SqlitePool>) -> Result<Json<Vec<Employee>>, AppError> {
    let employees = db::list_employees(&pool).await?;
    info!("Successfully retrieved {} employees.", employees.len());
    Ok(Json(employees))
}

pub async fn get_employee(
    State(pool): State<SqlitePool>,
    Path(employee_id): Path<i64>,
) -> Result<Json<Employee>, AppError> {
    db::get_employee(&pool, employee_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Employee", employee_id))
}

/// Handler for creating a new employee.
pub async fn create_employee(
    State(pool): State<SqlitePool>,
    Json(payload): Json<EmployeePayload>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    debug!(
        "Received request to create employee: {} {}",
        payload.first_name, payload.last_name
    );
    payload.validate()?;
    check_position(&pool, &payload).await?;

    let employee = db::create_employee(&pool, payload).await?;
    info!("Employee created successfully with ID: {}", employee.id);
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn update_employee(
    State(pool): State<SqlitePool>,
    Path(employee_id): Path<i64>,
    Json(payload): Json<EmployeePayload>,
) -> Result<Json<Employee>, AppError> {
    payload.validate()?;
    check_position(&pool, &payload).await?;

    let employee = db::update_employee(&pool, employee_id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Employee", employee_id))?;
    info!("Employee {} updated.", employee_id);
    Ok(Json(employee))
}

/// Handler for soft deleting an employee by ID.
pub async fn delete_employee(
    State(pool): State<SqlitePool>,
    Path(employee_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete employee with ID: {}", employee_id);
    if db::soft_delete_employee(&pool, employee_id).await? {
        info!("Employee with ID {} deleted successfully.", employee_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Employee", employee_id))
    }
}

// --- Positions ---

pub async fn list_positions(State(pool): State<SqlitePool>) -> Result<Json<Vec<Position>>, AppError> {
    Ok(Json(db::list_positions(&pool).await?))
}

pub async fn create_position(
    State(pool): State<SqlitePool>,
    Json(payload): Json<PositionPayload>,
) -> Result<(StatusCode, Json<Position>), AppError> {
    payload.validate()?;
    let position = db::create_position(&pool, payload).await?;
    info!("Position '{}' created with ID: {}", position.title, position.id);
    Ok((StatusCode::CREATED, Json(position)))
}

pub async fn update_position(
    State(pool): State<SqlitePool>,
    Path(position_id): Path<i64>,
    Json(payload): Json<PositionPayload>,
) -> Result<Json<Position>, AppError> {
    payload.validate()?;
    db::update_position(&pool, position_id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Position", position_id))
}

/// A position still held by active employees cannot be removed.
pub async fn delete_position(
    State(pool): State<SqlitePool>,
    Path(position_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let holders = db::count_position_holders(&pool, position_id).await?;
    if holders > 0 {
        return Err(AppError::conflict(&format!(
            "Position {position_id} is still held by {holders} employee(s)."
        )));
    }
    if db::delete_position(&pool, position_id).await? {
        info!("Position with ID {} deleted.", position_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Position", position_id))
    }
}
