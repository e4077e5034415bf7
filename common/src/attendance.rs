// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Attendance logs and the two derivations computed from them:
//! the Present/Late/Absent/Scheduled status and the hours worked.
use crate::error::ValidationErrors;
use crate::time::{self, TimeError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minutes after the shift start during which a sign-in still counts as on time.
pub const LATE_GRACE_MINUTES: u32 = 15;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttendanceStatus {
    Scheduled,
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    /// Whether the employee actually reported for the shift.
    pub fn is_worked(self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

/// Derives the attendance status of one shift.
///
/// `shift_start` and `sign_in` are `HH:MM` on the schedule date. A sign-in
/// strictly more than [`LATE_GRACE_MINUTES`] after the shift start is late;
/// without a sign-in the shift is absent once its date has passed and still
/// scheduled otherwise.
pub fn derive_status(
    shift_start: &str,
    sign_in: Option<&str>,
    schedule_date: NaiveDate,
    today: NaiveDate,
) -> Result<AttendanceStatus, TimeError> {
    let start = time::parse_minutes(shift_start)?;
    let status = match time::parse_optional_minutes(sign_in)? {
        Some(signed_in) if signed_in > start + LATE_GRACE_MINUTES => AttendanceStatus::Late,
        Some(_) => AttendanceStatus::Present,
        None if schedule_date < today => AttendanceStatus::Absent,
        None => AttendanceStatus::Scheduled,
    };
    Ok(status)
}

/// Minutes worked between sign-in and sign-out, minus a positive break.
///
/// The break is only subtracted when both ends are present and
/// `break_in > break_out`. The result never goes below zero, and a missing
/// sign-in or sign-out yields zero.
pub fn minutes_worked(
    sign_in: Option<&str>,
    sign_out: Option<&str>,
    break_out: Option<&str>,
    break_in: Option<&str>,
) -> Result<i64, TimeError> {
    let (Some(start), Some(end)) = (
        time::parse_optional_minutes(sign_in)?,
        time::parse_optional_minutes(sign_out)?,
    ) else {
        return Ok(0);
    };

    let mut total = i64::from(end) - i64::from(start);
    if let (Some(out), Some(back)) = (
        time::parse_optional_minutes(break_out)?,
        time::parse_optional_minutes(break_in)?,
    ) {
        if back > out {
            total -= i64::from(back - out);
        }
    }
    Ok(total.max(0))
}

/// [`minutes_worked`] formatted as `"Xh Ym"`.
pub fn hours_worked(
    sign_in: Option<&str>,
    sign_out: Option<&str>,
    break_out: Option<&str>,
    break_in: Option<&str>,
) -> Result<String, TimeError> {
    minutes_worked(sign_in, sign_out, break_out, break_in).map(time::format_duration)
}

/// One stored attendance log. There is at most one per (employee, date).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AttendanceLog {
    pub id: i64,
    pub employee_id: i64,
    pub log_date: NaiveDate,
    pub sign_in: Option<String>,
    pub sign_out: Option<String>,
    pub break_out: Option<String>,
    pub break_in: Option<String>,
}

impl AttendanceLog {
    pub fn minutes_worked(&self) -> Result<i64, TimeError> {
        minutes_worked(
            self.sign_in.as_deref(),
            self.sign_out.as_deref(),
            self.break_out.as_deref(),
            self.break_in.as_deref(),
        )
    }
}

/// Body of `POST /api/attendance-logs`. Posting again for the same employee
/// and date replaces the earlier log.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AttendanceLogPayload {
    pub employee_id: i64,
    pub log_date: NaiveDate,
    pub sign_in: Option<String>,
    pub sign_out: Option<String>,
    pub break_out: Option<String>,
    pub break_in: Option<String>,
}

impl AttendanceLogPayload {
    /// Validates the time fields and rewrites them as `HH:MM`.
    pub fn normalized(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let fields = [
            ("sign_in", &mut self.sign_in),
            ("sign_out", &mut self.sign_out),
            ("break_out", &mut self.break_out),
            ("break_in", &mut self.break_in),
        ];
        for (name, slot) in fields {
            let raw = slot.take();
            match raw.as_deref().map(str::trim) {
                None | Some("") => {}
                Some(value) => match time::normalize(value) {
                    Ok(v) => *slot = Some(v),
                    Err(e) => errors.add(name, e.to_string()),
                },
            }
        }
        if self.sign_in.is_none() && self.sign_out.is_some() {
            errors.add("sign_in", "Sign-in is required when a sign-out is recorded.");
        }
        errors.into_result()?;
        Ok(self)
    }
}

/// A derived attendance row: one scheduled shift joined with its log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AttendanceRow {
    pub employee_id: i64,
    pub employee_name: String,
    pub schedule_date: NaiveDate,
    pub shift_start: String,
    pub shift_end: String,
    pub sign_in: Option<String>,
    pub sign_out: Option<String>,
    pub break_out: Option<String>,
    pub break_in: Option<String>,
    pub status: AttendanceStatus,
    pub hours_worked: String,
}

impl AttendanceRow {
    /// Joins a shift with its (optional) log and derives status and hours.
    pub fn derive(
        employee_id: i64,
        employee_name: String,
        schedule_date: NaiveDate,
        shift_start: &str,
        shift_end: &str,
        log: Option<&AttendanceLog>,
        today: NaiveDate,
    ) -> Result<Self, TimeError> {
        let sign_in = log.and_then(|l| l.sign_in.clone());
        let status = derive_status(shift_start, sign_in.as_deref(), schedule_date, today)?;
        let worked = match log {
            Some(l) => l.minutes_worked()?,
            None => 0,
        };
        Ok(Self {
            employee_id,
            employee_name,
            schedule_date,
            shift_start: shift_start.to_string(),
            shift_end: shift_end.to_string(),
            sign_in,
            sign_out: log.and_then(|l| l.sign_out.clone()),
            break_out: log.and_then(|l| l.break_out.clone()),
            break_in: log.and_then(|l| l.break_in.clone()),
            status,
            hours_worked: time::format_duration(worked),
        })
    }
}
