// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Leave requests, their day-count rules and leave credits.
//!
//! Statutory leave (maternity, paternity) has fixed lengths and the end date
//! is computed; the other types count the chosen dates inclusively and draw
//! from a yearly credit balance.
use crate::error::ValidationErrors;
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MATERNITY_NORMAL_DAYS: i64 = 105;
pub const MATERNITY_MISCARRIAGE_DAYS: i64 = 60;
pub const SOLO_PARENT_EXTENSION_DAYS: i64 = 15;
pub const MATERNITY_MIN_POSTNATAL_DAYS: i64 = 60;
pub const PATERNITY_DAYS: i64 = 7;
pub const PATERNITY_WINDOW_DAYS: i64 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
pub enum LeaveType {
    Vacation,
    Sick,
    Emergency,
    Maternity,
    Paternity,
}

impl LeaveType {
    pub const ALL: [LeaveType; 5] = [
        LeaveType::Vacation,
        LeaveType::Sick,
        LeaveType::Emergency,
        LeaveType::Maternity,
        LeaveType::Paternity,
    ];

    /// Types that consume a yearly credit balance.
    pub fn uses_credits(self) -> bool {
        matches!(self, LeaveType::Vacation | LeaveType::Sick | LeaveType::Emergency)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Declined,
    Canceled,
}

impl LeaveStatus {
    /// A request is decided once: only `Pending` may move, and never back to `Pending`.
    pub fn can_transition_to(self, next: LeaveStatus) -> bool {
        self == LeaveStatus::Pending && next != LeaveStatus::Pending
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaternityCase {
    Normal,
    Miscarriage,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: i64,
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub days: i64,
    pub status: LeaveStatus,
    pub reason: Option<String>,
    pub solo_parent: bool,
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date_from <= date && date <= self.date_to
    }
}

/// Body of `POST /api/leaves`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateLeavePayload {
    pub employee_id: i64,
    pub leave_type: LeaveType,
    /// Optional for paternity leave, where it defaults to the event date.
    pub date_from: Option<NaiveDate>,
    /// Only read for credit-based leave; statutory leave computes it.
    pub date_to: Option<NaiveDate>,
    pub maternity_case: Option<MaternityCase>,
    /// Expected delivery date, used to keep the postnatal minimum.
    pub expected_delivery: Option<NaiveDate>,
    /// Date of birth or miscarriage for paternity leave.
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub solo_parent: bool,
    #[serde(default)]
    pub solo_parent_id_uploaded: bool,
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveSpan {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub days: i64,
}

impl LeaveSpan {
    fn starting(date_from: NaiveDate, days: i64) -> Result<Self, LeaveError> {
        let date_to = u64::try_from(days - 1)
            .ok()
            .and_then(|offset| date_from.checked_add_days(Days::new(offset)))
            .ok_or(LeaveError::DateOutOfRange)?;
        Ok(Self {
            date_from,
            date_to,
            days,
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeaveError {
    #[error("A start date is required.")]
    MissingStartDate,
    #[error("The leave would end past the last supported date.")]
    DateOutOfRange,
    #[error("An end date is required.")]
    MissingEndDate,
    #[error("End date cannot be before the start date.")]
    EndBeforeStart,
    #[error("Select whether this is a normal delivery or a miscarriage.")]
    MissingMaternityCase,
    #[error("The solo parent extension requires an uploaded Solo Parent ID.")]
    SoloParentProofMissing,
    #[error("At least 60 days must be taken after delivery; start no more than {max_prenatal} days before it.")]
    InsufficientPostnatal { max_prenatal: i64 },
    #[error("The date of birth or miscarriage is required.")]
    MissingEventDate,
    #[error("Paternity leave cannot start before the date of birth or miscarriage.")]
    PaternityBeforeEvent,
    #[error("Paternity leave must start within 60 days of the birth or miscarriage.")]
    PaternityWindowExpired,
    #[error("Insufficient leave credits: {remaining} day(s) remaining, {requested} requested.")]
    InsufficientCredits { remaining: i64, requested: i64 },
}

impl LeaveError {
    /// Payload field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            LeaveError::MissingStartDate
            | LeaveError::DateOutOfRange
            | LeaveError::PaternityBeforeEvent
            | LeaveError::PaternityWindowExpired => "date_from",
            LeaveError::MissingEndDate | LeaveError::EndBeforeStart => "date_to",
            LeaveError::MissingMaternityCase => "maternity_case",
            LeaveError::SoloParentProofMissing => "solo_parent_id_uploaded",
            LeaveError::InsufficientPostnatal { .. } => "expected_delivery",
            LeaveError::MissingEventDate => "event_date",
            LeaveError::InsufficientCredits { .. } => "days",
        }
    }
}

impl From<LeaveError> for ValidationErrors {
    fn from(err: LeaveError) -> Self {
        ValidationErrors::single(err.field(), err.to_string())
    }
}

/// Derives the date range and day count of a leave request.
pub fn compute_span(payload: &CreateLeavePayload) -> Result<LeaveSpan, LeaveError> {
    match payload.leave_type {
        LeaveType::Maternity => maternity_span(payload),
        LeaveType::Paternity => paternity_span(payload),
        LeaveType::Vacation | LeaveType::Sick | LeaveType::Emergency => {
            let from = payload.date_from.ok_or(LeaveError::MissingStartDate)?;
            let to = payload.date_to.ok_or(LeaveError::MissingEndDate)?;
            if to < from {
                return Err(LeaveError::EndBeforeStart);
            }
            Ok(LeaveSpan {
                date_from: from,
                date_to: to,
                days: (to - from).num_days() + 1,
            })
        }
    }
}

fn maternity_span(payload: &CreateLeavePayload) -> Result<LeaveSpan, LeaveError> {
    let from = payload.date_from.ok_or(LeaveError::MissingStartDate)?;
    let days = match payload.maternity_case.ok_or(LeaveError::MissingMaternityCase)? {
        MaternityCase::Miscarriage => MATERNITY_MISCARRIAGE_DAYS,
        MaternityCase::Normal if payload.solo_parent => {
            if !payload.solo_parent_id_uploaded {
                return Err(LeaveError::SoloParentProofMissing);
            }
            MATERNITY_NORMAL_DAYS + SOLO_PARENT_EXTENSION_DAYS
        }
        MaternityCase::Normal => MATERNITY_NORMAL_DAYS,
    };

    if let Some(delivery) = payload.expected_delivery {
        let max_prenatal = days - MATERNITY_MIN_POSTNATAL_DAYS;
        if (delivery - from).num_days() > max_prenatal {
            return Err(LeaveError::InsufficientPostnatal { max_prenatal });
        }
    }
    LeaveSpan::starting(from, days)
}

fn paternity_span(payload: &CreateLeavePayload) -> Result<LeaveSpan, LeaveError> {
    let event = payload.event_date.ok_or(LeaveError::MissingEventDate)?;
    let from = payload.date_from.unwrap_or(event);
    let offset = (from - event).num_days();
    if offset < 0 {
        return Err(LeaveError::PaternityBeforeEvent);
    }
    if offset > PATERNITY_WINDOW_DAYS {
        return Err(LeaveError::PaternityWindowExpired);
    }
    LeaveSpan::starting(from, PATERNITY_DAYS)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LeaveStatusPayload {
    pub status: LeaveStatus,
}

// ---------------------------------------------------------------------------
// Credits
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LeaveCredit {
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub year: i32,
    pub allotted_days: i64,
}

/// Remaining balance of one leave type for one year.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreditBalance {
    pub leave_type: LeaveType,
    pub year: i32,
    pub allotted_days: i64,
    pub used_days: i64,
    pub remaining_days: i64,
}

impl CreditBalance {
    pub fn new(leave_type: LeaveType, year: i32, allotted_days: i64, used_days: i64) -> Self {
        Self {
            leave_type,
            year,
            allotted_days,
            used_days,
            remaining_days: (allotted_days - used_days).max(0),
        }
    }

    pub fn ensure_covers(&self, requested: i64) -> Result<(), LeaveError> {
        if requested > self.remaining_days {
            return Err(LeaveError::InsufficientCredits {
                remaining: self.remaining_days,
                requested,
            });
        }
        Ok(())
    }
}

/// Days of `approved` requests of `leave_type` charged to `year`.
/// A request is charged to the year its first day falls in.
pub fn used_days(approved: &[LeaveRequest], leave_type: LeaveType, year: i32) -> i64 {
    approved
        .iter()
        .filter(|r| r.status == LeaveStatus::Approved)
        .filter(|r| r.leave_type == leave_type && r.date_from.year() == year)
        .map(|r| r.days)
        .sum()
}

/// Body of `PUT /api/leaves/credits`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SetCreditPayload {
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub year: i32,
    pub allotted_days: i64,
}

impl SetCreditPayload {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !self.leave_type.uses_credits() {
            errors.add("leave_type", "Statutory leave does not use credits.");
        }
        if self.allotted_days < 0 {
            errors.add("allotted_days", "Allotted days cannot be negative.");
        }
        errors.into_result()
    }
}

/// Yearly allotments granted to every active employee on rollover.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveDefaults {
    pub vacation: i64,
    pub sick: i64,
    pub emergency: i64,
}

impl Default for LeaveDefaults {
    fn default() -> Self {
        Self {
            vacation: 15,
            sick: 15,
            emergency: 5,
        }
    }
}

impl LeaveDefaults {
    pub fn allotments(&self) -> [(LeaveType, i64); 3] {
        [
            (LeaveType::Vacation, self.vacation),
            (LeaveType::Sick, self.sick),
            (LeaveType::Emergency, self.emergency),
        ]
    }
}
