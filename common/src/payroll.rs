// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Gross-pay generation from schedules, attendance, holidays and approved leave,
//! plus the stored payroll record with its editable adjustments.
use crate::attendance::{self, AttendanceLog, AttendanceStatus};
use crate::error::ValidationErrors;
use crate::leave::{LeaveRequest, LeaveStatus};
use crate::models::{self, Holiday, HolidayType, round2};
use crate::time::TimeError;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::{BTreeMap, HashMap};

pub const BASIC_PAY: &str = "Basic Pay";
pub const HOLIDAY_PAY: &str = "Holiday Pay";
pub const LEAVE_PAY: &str = "Leave Pay";

/// An employee as payroll sees them: a name and a monthly salary.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollEmployee {
    pub employee_id: i64,
    pub name: String,
    pub monthly_salary: f64,
}

/// A scheduled shift of one employee on one date.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Shift {
    pub employee_id: i64,
    pub schedule_date: NaiveDate,
    pub start_time: String,
}

/// Everything one payroll run reads. Rows outside the period are ignored.
#[derive(Debug, Clone, Copy)]
pub struct PayrollInput<'a> {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub today: NaiveDate,
    pub employees: &'a [PayrollEmployee],
    pub shifts: &'a [Shift],
    pub logs: &'a [AttendanceLog],
    pub holidays: &'a [Holiday],
    pub leaves: &'a [LeaveRequest],
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    Worked,
    PaidLeave,
    UnexcusedAbsence,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub kind: DayKind,
    pub status: AttendanceStatus,
    pub holiday: Option<HolidayType>,
    pub base_pay: f64,
    pub holiday_pay: f64,
    pub leave_pay: f64,
    pub pay: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Earning {
    pub label: String,
    pub amount: f64,
}

/// Gross pay of one employee over one period.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PayrollComputation {
    pub employee_id: i64,
    pub employee_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub daily_rate: f64,
    pub days: Vec<DayEntry>,
    pub days_worked: u32,
    pub leave_days: u32,
    pub absences: u32,
    pub base_pay: f64,
    pub holiday_pay: f64,
    pub leave_pay: f64,
    pub total_gross: f64,
    pub earnings: Vec<Earning>,
}

impl PayrollComputation {
    fn from_days(employee: &PayrollEmployee, input: &PayrollInput, days: Vec<DayEntry>) -> Self {
        let count = |kind| days.iter().filter(|d| d.kind == kind).count() as u32;
        let sum = |f: fn(&DayEntry) -> f64| round2(days.iter().map(f).sum());

        let base_pay = sum(|d| d.base_pay);
        let holiday_pay = sum(|d| d.holiday_pay);
        let leave_pay = sum(|d| d.leave_pay);

        let mut earnings = vec![Earning {
            label: BASIC_PAY.to_string(),
            amount: base_pay,
        }];
        for (label, amount) in [(HOLIDAY_PAY, holiday_pay), (LEAVE_PAY, leave_pay)] {
            if amount > 0.0 {
                earnings.push(Earning {
                    label: label.to_string(),
                    amount,
                });
            }
        }

        Self {
            employee_id: employee.employee_id,
            employee_name: employee.name.clone(),
            period_start: input.period_start,
            period_end: input.period_end,
            daily_rate: round2(models::daily_rate(employee.monthly_salary)),
            days_worked: count(DayKind::Worked),
            leave_days: count(DayKind::PaidLeave),
            absences: count(DayKind::UnexcusedAbsence),
            total_gross: round2(base_pay + holiday_pay + leave_pay),
            base_pay,
            holiday_pay,
            leave_pay,
            earnings,
            days,
        }
    }
}

/// Iterates the Monday-to-Friday dates of `[start, end]`.
pub fn weekdays(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}

/// Computes gross pay for every employee over the period.
///
/// For each weekday with a scheduled shift: a worked day pays the daily rate,
/// multiplied on holidays with the excess tracked as holiday pay; an absence
/// covered by approved leave pays the daily rate as leave pay; any other
/// absence is recorded with zero pay. Shifts that have not happened yet are
/// skipped.
pub fn generate(input: &PayrollInput) -> Result<Vec<PayrollComputation>, TimeError> {
    let shifts: HashMap<(i64, NaiveDate), &Shift> = input
        .shifts
        .iter()
        .map(|s| ((s.employee_id, s.schedule_date), s))
        .collect();
    let logs: HashMap<(i64, NaiveDate), &AttendanceLog> = input
        .logs
        .iter()
        .map(|l| ((l.employee_id, l.log_date), l))
        .collect();
    let holidays: HashMap<NaiveDate, HolidayType> = input
        .holidays
        .iter()
        .map(|h| (h.holiday_date, h.holiday_type))
        .collect();

    let mut computations = Vec::with_capacity(input.employees.len());
    for employee in input.employees {
        let exact_rate = models::daily_rate(employee.monthly_salary);
        let rate = round2(exact_rate);
        let mut days = Vec::new();

        for date in weekdays(input.period_start, input.period_end) {
            let Some(shift) = shifts.get(&(employee.employee_id, date)) else {
                continue;
            };
            let sign_in = logs
                .get(&(employee.employee_id, date))
                .and_then(|l| l.sign_in.as_deref());
            let status = attendance::derive_status(&shift.start_time, sign_in, date, input.today)?;
            let holiday = holidays.get(&date).copied();

            let entry = if status.is_worked() {
                let pay = holiday.map_or(rate, |h| round2(exact_rate * h.pay_multiplier()));
                DayEntry {
                    date,
                    kind: DayKind::Worked,
                    status,
                    holiday,
                    base_pay: rate,
                    holiday_pay: round2(pay - rate),
                    leave_pay: 0.0,
                    pay,
                }
            } else if status == AttendanceStatus::Absent {
                let on_leave = input.leaves.iter().any(|l| {
                    l.employee_id == employee.employee_id
                        && l.status == LeaveStatus::Approved
                        && l.covers(date)
                });
                let leave_pay = if on_leave { rate } else { 0.0 };
                DayEntry {
                    date,
                    kind: if on_leave {
                        DayKind::PaidLeave
                    } else {
                        DayKind::UnexcusedAbsence
                    },
                    status,
                    holiday,
                    base_pay: 0.0,
                    holiday_pay: 0.0,
                    leave_pay,
                    pay: leave_pay,
                }
            } else {
                continue;
            };
            days.push(entry);
        }

        computations.push(PayrollComputation::from_days(employee, input, days));
    }
    Ok(computations)
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
pub enum PayrollStatus {
    Pending,
    Paid,
}

/// A generated payroll record. Gross figures are frozen at generation time;
/// adjustments stay editable until the record is paid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PayrollRecord {
    pub id: i64,
    pub employee_id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub base_pay: f64,
    pub holiday_pay: f64,
    pub leave_pay: f64,
    pub total_gross: f64,
    pub earnings: Json<Vec<Earning>>,
    pub deductions: Json<BTreeMap<String, f64>>,
    pub allowances: f64,
    pub bonuses: f64,
    pub loan_repayment: f64,
    pub net_pay: f64,
    pub status: PayrollStatus,
    pub created_at: DateTime<Utc>,
}

/// Body of `PUT /api/payroll/{id}/adjustments`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AdjustmentsPayload {
    #[serde(default)]
    pub allowances: f64,
    #[serde(default)]
    pub bonuses: f64,
    #[serde(default)]
    pub loan_repayment: f64,
    /// Named deductions, e.g. `"SSS"`, `"PhilHealth"`, `"Pag-IBIG"`, `"Withholding Tax"`.
    #[serde(default)]
    pub deductions: BTreeMap<String, f64>,
}

impl AdjustmentsPayload {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let amounts = [
            ("allowances", self.allowances),
            ("bonuses", self.bonuses),
            ("loan_repayment", self.loan_repayment),
        ];
        for (field, amount) in amounts {
            if !amount.is_finite() || amount < 0.0 {
                errors.add(field, "Amount must be a non-negative number.");
            }
        }
        for (name, amount) in &self.deductions {
            if name.trim().is_empty() {
                errors.add("deductions", "Deduction names cannot be empty.");
            }
            if !amount.is_finite() || *amount < 0.0 {
                errors.add(&format!("deductions.{name}"), "Amount must be a non-negative number.");
            }
        }
        errors.into_result()
    }

    /// `gross + allowances + bonuses - loan repayment - deductions`, in centavos precision.
    pub fn net_pay(&self, total_gross: f64) -> f64 {
        let deductions: f64 = self.deductions.values().sum();
        round2(total_gross + self.allowances + self.bonuses - self.loan_repayment - deductions)
    }
}

/// Body of `POST /api/payroll` and `POST /api/payroll/preview`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneratePayrollPayload {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Restricts the run to these employees; all active employees otherwise.
    pub employee_ids: Option<Vec<i64>>,
}

impl GeneratePayrollPayload {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        if self.period_end < self.period_start {
            return Err(ValidationErrors::single(
                "period_end",
                "Period end cannot be before the period start.",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::LeaveType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee(id: i64, monthly_salary: f64) -> PayrollEmployee {
        PayrollEmployee {
            employee_id: id,
            name: format!("Employee {id}"),
            monthly_salary,
        }
    }

    fn shift(employee_id: i64, schedule_date: NaiveDate) -> Shift {
        Shift {
            employee_id,
            schedule_date,
            start_time: "09:00".to_string(),
        }
    }

    fn log(employee_id: i64, log_date: NaiveDate, sign_in: &str) -> AttendanceLog {
        AttendanceLog {
            id: 0,
            employee_id,
            log_date,
            sign_in: Some(sign_in.to_string()),
            sign_out: Some("18:00".to_string()),
            break_out: None,
            break_in: None,
        }
    }

    // 2025-06-02 is a Monday.
    const TODAY: (i32, u32, u32) = (2025, 7, 1);

    fn input<'a>(
        employees: &'a [PayrollEmployee],
        shifts: &'a [Shift],
        logs: &'a [AttendanceLog],
        holidays: &'a [Holiday],
        leaves: &'a [LeaveRequest],
    ) -> PayrollInput<'a> {
        PayrollInput {
            period_start: date(2025, 6, 2),
            period_end: date(2025, 6, 8),
            today: date(TODAY.0, TODAY.1, TODAY.2),
            employees,
            shifts,
            logs,
            holidays,
            leaves,
        }
    }

    #[test]
    fn weekdays_skip_weekends() {
        let days: Vec<_> = weekdays(date(2025, 6, 6), date(2025, 6, 10)).collect();
        assert_eq!(days, vec![date(2025, 6, 6), date(2025, 6, 9), date(2025, 6, 10)]);
    }

    #[test]
    fn present_weekday_pays_exactly_the_daily_rate() {
        let employees = [employee(1, 22000.0), employee(2, 15000.0)];
        let day = date(2025, 6, 3);
        let shifts = [shift(1, day), shift(2, day)];
        let logs = [log(1, day, "09:00"), log(2, day, "09:30")];

        let result = generate(&input(&employees, &shifts, &logs, &[], &[])).unwrap();
        assert_eq!(result.len(), 2);
        for (computation, employee) in result.iter().zip(&employees) {
            assert_eq!(computation.days.len(), 1);
            assert_eq!(computation.days[0].pay, round2(employee.monthly_salary / 22.0));
            assert_eq!(computation.days_worked, 1);
        }
        assert_eq!(result[0].total_gross, 1000.0);
        assert_eq!(result[1].total_gross, 681.82);
        assert_eq!(result[1].days[0].status, AttendanceStatus::Late);
    }

    #[test]
    fn regular_holiday_doubles_and_splits_holiday_pay() {
        let employees = [employee(1, 22000.0)];
        let day = date(2025, 6, 12);
        let shifts = [shift(1, day)];
        let logs = [log(1, day, "08:55")];
        let holidays = [Holiday {
            id: 1,
            holiday_date: day,
            holiday_type: HolidayType::Regular,
            title: "Independence Day".to_string(),
        }];

        let mut run = input(&employees, &shifts, &logs, &holidays, &[]);
        run.period_end = date(2025, 6, 13);
        let result = generate(&run).unwrap();
        let c = &result[0];
        assert_eq!(c.total_gross, 2000.0);
        assert_eq!(c.base_pay, 1000.0);
        assert_eq!(c.holiday_pay, 1000.0);
        assert_eq!(
            c.earnings,
            vec![
                Earning { label: BASIC_PAY.into(), amount: 1000.0 },
                Earning { label: HOLIDAY_PAY.into(), amount: 1000.0 },
            ]
        );
    }

    #[test]
    fn special_holiday_pays_one_point_three() {
        let employees = [employee(1, 22000.0)];
        let day = date(2025, 6, 4);
        let shifts = [shift(1, day)];
        let logs = [log(1, day, "09:00")];
        let holidays = [Holiday {
            id: 1,
            holiday_date: day,
            holiday_type: HolidayType::Special,
            title: "Special Non-Working Day".to_string(),
        }];
        let result = generate(&input(&employees, &shifts, &logs, &holidays, &[])).unwrap();
        assert_eq!(result[0].total_gross, 1300.0);
        assert_eq!(result[0].holiday_pay, 300.0);
    }

    #[test]
    fn day_entries_are_rounded_like_the_totals() {
        let employees = [employee(1, 15000.0)];
        let day = date(2025, 6, 4);
        let shifts = [shift(1, day)];
        let logs = [log(1, day, "09:00")];
        let holidays = [Holiday {
            id: 1,
            holiday_date: day,
            holiday_type: HolidayType::Special,
            title: "Special Non-Working Day".to_string(),
        }];
        let result = generate(&input(&employees, &shifts, &logs, &holidays, &[])).unwrap();
        let c = &result[0];
        let entry = &c.days[0];
        assert_eq!(entry.base_pay, 681.82);
        assert_eq!(entry.holiday_pay, 204.54);
        assert_eq!(entry.pay, 886.36);
        assert_eq!(c.base_pay, entry.base_pay);
        assert_eq!(c.holiday_pay, entry.holiday_pay);
        assert_eq!(c.total_gross, entry.pay);
    }

    #[test]
    fn absences_and_leave() {
        let employees = [employee(1, 22000.0)];
        let (mon, tue, wed) = (date(2025, 6, 2), date(2025, 6, 3), date(2025, 6, 4));
        // Saturday shift is ignored.
        let shifts = [shift(1, mon), shift(1, tue), shift(1, wed), shift(1, date(2025, 6, 7))];
        let logs = [log(1, mon, "09:00"), log(1, date(2025, 6, 7), "09:00")];
        let leaves = [LeaveRequest {
            id: 1,
            employee_id: 1,
            leave_type: LeaveType::Sick,
            date_from: wed,
            date_to: wed,
            days: 1,
            status: LeaveStatus::Approved,
            reason: None,
            solo_parent: false,
            created_at: Utc::now(),
        }];

        let result = generate(&input(&employees, &shifts, &logs, &[], &leaves)).unwrap();
        let c = &result[0];
        assert_eq!(c.days.len(), 3);
        assert_eq!(c.days[1].kind, DayKind::UnexcusedAbsence);
        assert_eq!(c.days[1].pay, 0.0);
        assert_eq!(c.days[2].kind, DayKind::PaidLeave);
        assert_eq!((c.days_worked, c.absences, c.leave_days), (1, 1, 1));
        assert_eq!(c.base_pay, 1000.0);
        assert_eq!(c.leave_pay, 1000.0);
        assert_eq!(c.total_gross, 2000.0);
    }

    #[test]
    fn future_shifts_are_skipped() {
        let employees = [employee(1, 22000.0)];
        let day = date(2025, 6, 3);
        let shifts = [shift(1, day)];
        let mut run = input(&employees, &shifts, &[], &[], &[]);
        run.today = day;
        let result = generate(&run).unwrap();
        assert!(result[0].days.is_empty());
        assert_eq!(result[0].total_gross, 0.0);
    }

    #[test]
    fn net_pay_applies_adjustments() {
        let mut adjustments = AdjustmentsPayload {
            allowances: 500.0,
            bonuses: 250.5,
            loan_repayment: 300.0,
            ..Default::default()
        };
        adjustments.deductions.insert("SSS".to_string(), 450.0);
        adjustments.deductions.insert("PhilHealth".to_string(), 125.25);
        assert!(adjustments.validate().is_ok());
        assert_eq!(adjustments.net_pay(10000.0), 9875.25);

        adjustments.deductions.insert("Tax".to_string(), -1.0);
        assert!(adjustments.validate().is_err());
    }
}
