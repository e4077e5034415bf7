// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers::{
    attendance, disciplinary, employees, holidays, leaves, payroll, schedules, training,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use tower_http::trace::TraceLayer;

/// Creates and configures the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Employees and positions
        .route(
            "/api/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/api/employees/{id}",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route(
            "/api/positions",
            get(employees::list_positions).post(employees::create_position),
        )
        .route(
            "/api/positions/{id}",
            put(employees::update_position).delete(employees::delete_position),
        )
        // Scheduling
        .route(
            "/api/templates",
            get(schedules::list_templates).post(schedules::create_template),
        )
        .route(
            "/api/templates/{id}",
            delete(schedules::delete_template),
        )
        .route(
            "/api/schedules",
            get(schedules::list_schedules).post(schedules::create_schedule),
        )
        .route(
            "/api/schedules/{id}",
            get(schedules::get_schedule).delete(schedules::delete_schedule),
        )
        // Attendance
        .route("/api/attendance", get(attendance::attendance_sheet))
        .route(
            "/api/attendance-logs",
            get(attendance::list_logs).post(attendance::record_log),
        )
        .route(
            "/api/holidays",
            get(holidays::list_holidays).post(holidays::create_holiday),
        )
        .route(
            "/api/holidays/{id}",
            delete(holidays::delete_holiday),
        )
        // Leave
        .route(
            "/api/leaves",
            get(leaves::list_leaves).post(leaves::create_leave),
        )
        .route("/api/leaves/{id}/status", patch(leaves::update_leave_status))
        .route("/api/leaves/credits", put(leaves::set_credit))
        // Static segment, matched before the `{employee_id}` route below.
        .route("/api/leaves/credits/rollover", patch(leaves::rollover_credits))
        .route(
            "/api/leaves/credits/{employee_id}",
            get(leaves::credit_balances),
        )
        // Payroll
        .route("/api/payroll/preview", post(payroll::preview_payroll))
        .route(
            "/api/payroll",
            get(payroll::list_payroll).post(payroll::generate_payroll),
        )
        .route(
            "/api/payroll/{id}/adjustments",
            put(payroll::update_adjustments),
        )
        .route("/api/payroll/{id}/pay", patch(payroll::mark_paid))
        // Training and discipline
        .route(
            "/api/training",
            get(training::list_trainings).post(training::create_training),
        )
        .route(
            "/api/training/{id}",
            get(training::get_training).delete(training::delete_training),
        )
        .route("/api/training/{id}/participants", post(training::enroll))
        .route(
            "/api/disciplinary-cases",
            get(disciplinary::list_cases).post(disciplinary::create_case),
        )
        .route(
            "/api/disciplinary-cases/{id}/status",
            patch(disciplinary::update_case_status),
        )
        .layer(TraceLayer::new_for_http())
        // Adds the database pool and leave defaults to the application state
        .with_state(state)
}
