// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Plain records for the HR resources and the payloads used to create them.
//!
//! Attendance, leave and payroll live in their own modules because they carry
//! derivation logic; everything here is a direct mapping of form fields.
use crate::error::ValidationErrors;
use crate::time;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Working days per month used to turn a monthly salary into a daily rate.
pub const WORKING_DAYS_PER_MONTH: f64 = 22.0;

/// Rounds a peso amount to centavos.
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn require_text(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
    }
}

// ---------------------------------------------------------------------------
// Employees and positions
// ---------------------------------------------------------------------------

/// An employee record. Soft-deleted rows keep their `deleted_at` stamp so that
/// historical payroll records still resolve a name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub position_id: Option<i64>,
    pub gender: Option<String>,
    pub joining_date: NaiveDate,
    // Government-issued identifiers.
    pub sss_number: Option<String>,
    pub philhealth_number: Option<String>,
    pub pagibig_number: Option<String>,
    pub tin: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Body of `POST /api/employees` and `PUT /api/employees/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EmployeePayload {
    pub first_name: String,
    pub last_name: String,
    pub position_id: Option<i64>,
    pub gender: Option<String>,
    pub joining_date: NaiveDate,
    pub sss_number: Option<String>,
    pub philhealth_number: Option<String>,
    pub pagibig_number: Option<String>,
    pub tin: Option<String>,
}

impl EmployeePayload {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "first_name", &self.first_name);
        require_text(&mut errors, "last_name", &self.last_name);
        if let Some(gender) = &self.gender {
            if !matches!(gender.as_str(), "Male" | "Female") {
                errors.add("gender", "Gender must be 'Male' or 'Female'.");
            }
        }
        let id_fields = [
            ("sss_number", &self.sss_number),
            ("philhealth_number", &self.philhealth_number),
            ("pagibig_number", &self.pagibig_number),
            ("tin", &self.tin),
        ];
        for (field, value) in id_fields {
            let bad = value
                .as_deref()
                .is_some_and(|v| !v.chars().all(|c| c.is_ascii_digit() || c == '-'));
            if bad {
                errors.add(field, "Only digits and dashes are allowed.");
            }
        }
        errors.into_result()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Position {
    pub id: i64,
    pub title: String,
    pub monthly_salary: f64,
}

impl Position {
    /// Daily rate derived from the monthly salary (`monthly / 22`).
    pub fn daily_rate(&self) -> f64 {
        daily_rate(self.monthly_salary)
    }
}

pub fn daily_rate(monthly_salary: f64) -> f64 {
    monthly_salary / WORKING_DAYS_PER_MONTH
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PositionPayload {
    pub title: String,
    pub monthly_salary: f64,
}

impl PositionPayload {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "title", &self.title);
        if !self.monthly_salary.is_finite() || self.monthly_salary < 0.0 {
            errors.add("monthly_salary", "Monthly salary must be a non-negative amount.");
        }
        errors.into_result()
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// A schedule groups the per-employee shift assignments of one date.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Schedule {
    pub id: i64,
    pub schedule_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ScheduleAssignment {
    pub id: i64,
    pub schedule_id: i64,
    pub employee_id: i64,
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
}

/// A schedule together with its grid of assignments, as returned by the API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScheduleDetail {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub assignments: Vec<ScheduleAssignment>,
}

/// Reusable shift times ("Morning 08:00-17:00").
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ScheduleTemplate {
    pub id: i64,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TemplatePayload {
    pub name: String,
    pub start_time: String,
    pub end_time: String,
}

impl TemplatePayload {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        for (field, value) in [("start_time", &self.start_time), ("end_time", &self.end_time)] {
            if let Err(e) = time::parse_minutes(value) {
                errors.add(field, e.to_string());
            }
        }
        errors.into_result()
    }
}

/// One row of the schedule grid. Either a template or explicit times must be given;
/// explicit times win over the template's.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AssignmentPayload {
    pub employee_id: i64,
    pub template_id: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateSchedulePayload {
    pub schedule_date: NaiveDate,
    pub notes: Option<String>,
    pub assignments: Vec<AssignmentPayload>,
}

impl CreateSchedulePayload {
    /// Checks the grid shape: at least one row, each employee at most once,
    /// and times that parse whenever they are given.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.assignments.is_empty() {
            errors.add("assignments", "A schedule needs at least one assignment.");
        }

        let mut seen = HashSet::new();
        for (i, row) in self.assignments.iter().enumerate() {
            if !seen.insert(row.employee_id) {
                errors.add(
                    &format!("assignments[{i}].employee_id"),
                    format!("Employee {} is already in this schedule.", row.employee_id),
                );
            }
            for (name, value) in [("start_time", &row.start_time), ("end_time", &row.end_time)] {
                match value.as_deref() {
                    Some(v) => {
                        if let Err(e) = time::parse_minutes(v) {
                            errors.add(&format!("assignments[{i}].{name}"), e.to_string());
                        }
                    }
                    None if row.template_id.is_none() => {
                        errors.add(
                            &format!("assignments[{i}].{name}"),
                            "Required when no template is selected.",
                        );
                    }
                    None => {}
                }
            }
        }
        errors.into_result()
    }
}

// ---------------------------------------------------------------------------
// Holidays
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
pub enum HolidayType {
    Regular,
    Special,
}

impl HolidayType {
    /// Pay multiplier applied to the daily rate for a worked holiday.
    pub fn pay_multiplier(self) -> f64 {
        match self {
            HolidayType::Regular => 2.0,
            HolidayType::Special => 1.3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Holiday {
    pub id: i64,
    pub holiday_date: NaiveDate,
    pub holiday_type: HolidayType,
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HolidayPayload {
    pub holiday_date: NaiveDate,
    pub holiday_type: HolidayType,
    pub title: String,
}

impl HolidayPayload {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "title", &self.title);
        errors.into_result()
    }
}

// ---------------------------------------------------------------------------
// Training programs
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TrainingProgram {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    // Filled from the participants table, not a column.
    #[sqlx(skip)]
    #[serde(default)]
    pub participants: Vec<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TrainingPayload {
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub participants: Vec<i64>,
}

impl TrainingPayload {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "title", &self.title);
        if self.end_date < self.start_date {
            errors.add("end_date", "End date cannot be before the start date.");
        }
        errors.into_result()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnrollPayload {
    pub employee_ids: Vec<i64>,
}

// ---------------------------------------------------------------------------
// Disciplinary cases
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
pub enum CaseStatus {
    Open,
    Resolved,
    Dismissed,
}

impl CaseStatus {
    /// Only open cases can be closed, and they are closed exactly once.
    pub fn can_transition_to(self, next: CaseStatus) -> bool {
        matches!(
            (self, next),
            (CaseStatus::Open, CaseStatus::Resolved) | (CaseStatus::Open, CaseStatus::Dismissed)
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DisciplinaryCase {
    pub id: i64,
    pub employee_id: i64,
    pub violation: String,
    pub description: Option<String>,
    pub incident_date: NaiveDate,
    pub action_taken: Option<String>,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CasePayload {
    pub employee_id: i64,
    pub violation: String,
    pub description: Option<String>,
    pub incident_date: NaiveDate,
}

impl CasePayload {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "violation", &self.violation);
        if self.incident_date > today {
            errors.add("incident_date", "Incident date cannot be in the future.");
        }
        errors.into_result()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CaseStatusPayload {
    pub status: CaseStatus,
    pub action_taken: Option<String>,
}
