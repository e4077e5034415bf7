// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Shared HR records and the pure derivations computed from them.
//!
//! Both the server and the API client depend on this crate, so the attendance,
//! leave and payroll rules exist in exactly one place.
pub mod attendance;
pub mod error;
pub mod leave;
pub mod models;
pub mod payroll;
pub mod time;

pub use attendance::{AttendanceLog, AttendanceLogPayload, AttendanceRow, AttendanceStatus};
pub use error::ValidationErrors;
pub use leave::{
    CreateLeavePayload, CreditBalance, LeaveCredit, LeaveDefaults, LeaveRequest, LeaveStatus,
    LeaveStatusPayload, LeaveType, MaternityCase, SetCreditPayload,
};
pub use models::*;
pub use payroll::{
    AdjustmentsPayload, GeneratePayrollPayload, PayrollComputation, PayrollRecord, PayrollStatus,
};
