// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::AppError;
use crate::database::holidays as db;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use common::{Holiday, HolidayPayload, ValidationErrors};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

pub async fn list_holidays(
    State(pool): State<SqlitePool>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<Holiday>>, AppError> {
    if let Some(year) = query.year {
        if NaiveDate::from_ymd_opt(year, 1, 1).is_none()
            || NaiveDate::from_ymd_opt(year, 12, 31).is_none()
        {
            let message = format!("{year} is not a supported year.");
            return Err(ValidationErrors::single("year", message).into());
        }
    }
    Ok(Json(db::list_holidays(&pool, query.year).await?))
}

pub async fn create_holiday(
    State(pool): State<SqlitePool>,
    Json(payload): Json<HolidayPayload>,
) -> Result<(StatusCode, Json<Holiday>), AppError> {
    payload.validate()?;
    let date = payload.holiday_date;
    let holiday = db::create_holiday(&pool, payload).await.map_err(|e| {
        AppError::duplicate_or_internal(e, "holiday_date", &format!("{date} is already a holiday."))
    })?;
    info!(
        "Holiday '{}' ({:?}) created for {}.",
        holiday.title, holiday.holiday_type, holiday.holiday_date
    );
    Ok((StatusCode::CREATED, Json(holiday)))
}

pub async fn delete_holiday(
    State(pool): State<SqlitePool>,
    Path(holiday_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if db::delete_holiday(&pool, holiday_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Holiday", holiday_id))
    }
}
