// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::error::{ClientError, ClientResult, GENERIC_MESSAGE, sanitize_message};
use crate::session::Session;
use chrono::NaiveDate;
use common::{
    AdjustmentsPayload, AttendanceLog, AttendanceLogPayload, AttendanceRow, CasePayload,
    CaseStatus, CaseStatusPayload, CreateLeavePayload, CreateSchedulePayload, CreditBalance,
    DisciplinaryCase, Employee, EmployeePayload, EnrollPayload, GeneratePayrollPayload, Holiday,
    HolidayPayload, LeaveRequest, LeaveStatus, LeaveStatusPayload, PayrollComputation,
    PayrollRecord, Position, PositionPayload, ScheduleDetail, ScheduleTemplate, SetCreditPayload,
    TemplatePayload, TrainingPayload, TrainingProgram, ValidationErrors,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Error body sent by the server: `{"error": "...", "fields": {...}}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    fields: ValidationErrors,
}

/// Result of `POST /api/payroll`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SavedPayroll {
    pub records: Vec<PayrollRecord>,
    pub skipped_paid: Vec<i64>,
}

/// Result of `PATCH /api/leaves/credits/rollover`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RolloverSummary {
    pub message: String,
    pub year: i32,
    pub credits_created: u64,
}

/// Typed HTTP client for the HR API.
///
/// Every request carries the session's bearer token. A 401 clears the
/// session before the error is returned.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<Session>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        let req = self.client.request(method, url);
        match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Maps a failed response to a `ClientError`, by status only.
    async fn error_from(&self, response: Response) -> ClientError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text).ok();
        let message = body.as_ref().map_or(text.as_str(), |b| b.error.as_str());
        warn!("Request failed with {}: {}", status, message);

        match status {
            StatusCode::UNAUTHORIZED => {
                self.session.clear();
                ClientError::Unauthorized
            }
            StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation {
                message: sanitize_message(message),
                fields: body.map(|b| b.fields).unwrap_or_default(),
            },
            StatusCode::NOT_FOUND => ClientError::NotFound(sanitize_message(message)),
            StatusCode::CONFLICT => ClientError::Conflict(sanitize_message(message)),
            s if s.is_server_error() => ClientError::Server(GENERIC_MESSAGE.to_string()),
            _ => ClientError::Server(sanitize_message(message)),
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(self.error_from(response).await);
        }
        Ok(response.json().await?)
    }

    /// For endpoints answering `204 No Content`.
    async fn send_empty(&self, req: RequestBuilder) -> ClientResult<()> {
        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(self.error_from(response).await);
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(reqwest::Method::GET, path)).await
    }

    async fn get_with<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<T> {
        self.send(self.request(reqwest::Method::GET, path).query(query))
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(reqwest::Method::POST, path).json(body))
            .await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(reqwest::Method::PUT, path).json(body))
            .await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<T> {
        let req = self.request(reqwest::Method::PATCH, path);
        let req = match body {
            Some(body) => req.json(body),
            None => req,
        };
        self.send(req).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send_empty(self.request(reqwest::Method::DELETE, path))
            .await
    }

    // --- Employees and positions ---

    pub async fn list_employees(&self) -> ClientResult<Vec<Employee>> {
        self.get("/api/employees").await
    }

    pub async fn get_employee(&self, id: i64) -> ClientResult<Employee> {
        self.get(&format!("/api/employees/{id}")).await
    }

    pub async fn create_employee(&self, payload: &EmployeePayload) -> ClientResult<Employee> {
        self.post("/api/employees", payload).await
    }

    pub async fn update_employee(&self, id: i64, payload: &EmployeePayload) -> ClientResult<Employee> {
        self.put(&format!("/api/employees/{id}"), payload).await
    }

    pub async fn delete_employee(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/employees/{id}")).await
    }

    pub async fn list_positions(&self) -> ClientResult<Vec<Position>> {
        self.get("/api/positions").await
    }

    pub async fn create_position(&self, payload: &PositionPayload) -> ClientResult<Position> {
        self.post("/api/positions", payload).await
    }

    pub async fn update_position(&self, id: i64, payload: &PositionPayload) -> ClientResult<Position> {
        self.put(&format!("/api/positions/{id}"), payload).await
    }

    pub async fn delete_position(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/positions/{id}")).await
    }

    // --- Scheduling ---

    pub async fn list_templates(&self) -> ClientResult<Vec<ScheduleTemplate>> {
        self.get("/api/templates").await
    }

    pub async fn create_template(&self, payload: &TemplatePayload) -> ClientResult<ScheduleTemplate> {
        self.post("/api/templates", payload).await
    }

    pub async fn delete_template(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/templates/{id}")).await
    }

    pub async fn list_schedules(&self, date: Option<NaiveDate>) -> ClientResult<Vec<ScheduleDetail>> {
        self.get_with("/api/schedules", &[("date", date)]).await
    }

    pub async fn get_schedule(&self, id: i64) -> ClientResult<ScheduleDetail> {
        self.get(&format!("/api/schedules/{id}")).await
    }

    pub async fn create_schedule(&self, payload: &CreateSchedulePayload) -> ClientResult<ScheduleDetail> {
        self.post("/api/schedules", payload).await
    }

    pub async fn delete_schedule(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/schedules/{id}")).await
    }

    // --- Attendance and holidays ---

    /// Derived attendance rows for `date` (the server's today when `None`).
    pub async fn attendance(&self, date: Option<NaiveDate>) -> ClientResult<Vec<AttendanceRow>> {
        self.get_with("/api/attendance", &[("date", date)]).await
    }

    pub async fn attendance_logs(&self, date: Option<NaiveDate>) -> ClientResult<Vec<AttendanceLog>> {
        self.get_with("/api/attendance-logs", &[("date", date)]).await
    }

    pub async fn record_attendance(&self, payload: &AttendanceLogPayload) -> ClientResult<AttendanceLog> {
        self.post("/api/attendance-logs", payload).await
    }

    pub async fn list_holidays(&self, year: Option<i32>) -> ClientResult<Vec<Holiday>> {
        self.get_with("/api/holidays", &[("year", year)]).await
    }

    pub async fn create_holiday(&self, payload: &HolidayPayload) -> ClientResult<Holiday> {
        self.post("/api/holidays", payload).await
    }

    pub async fn delete_holiday(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/holidays/{id}")).await
    }

    // --- Leave ---

    pub async fn list_leaves(
        &self,
        employee_id: Option<i64>,
        status: Option<LeaveStatus>,
    ) -> ClientResult<Vec<LeaveRequest>> {
        #[derive(Serialize)]
        struct Filter {
            #[serde(skip_serializing_if = "Option::is_none")]
            employee_id: Option<i64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            status: Option<LeaveStatus>,
        }
        self.get_with("/api/leaves", &Filter { employee_id, status })
            .await
    }

    pub async fn create_leave(&self, payload: &CreateLeavePayload) -> ClientResult<LeaveRequest> {
        self.post("/api/leaves", payload).await
    }

    pub async fn set_leave_status(&self, id: i64, status: LeaveStatus) -> ClientResult<LeaveRequest> {
        self.patch(
            &format!("/api/leaves/{id}/status"),
            Some(&LeaveStatusPayload { status }),
        )
        .await
    }

    pub async fn leave_credits(&self, employee_id: i64, year: Option<i32>) -> ClientResult<Vec<CreditBalance>> {
        self.get_with(&format!("/api/leaves/credits/{employee_id}"), &[("year", year)])
            .await
    }

    pub async fn set_leave_credit(&self, payload: &SetCreditPayload) -> ClientResult<CreditBalance> {
        self.put("/api/leaves/credits", payload).await
    }

    pub async fn rollover_leave_credits(&self) -> ClientResult<RolloverSummary> {
        self.patch::<_, ()>("/api/leaves/credits/rollover", None).await
    }

    // --- Payroll ---

    pub async fn preview_payroll(&self, payload: &GeneratePayrollPayload) -> ClientResult<Vec<PayrollComputation>> {
        self.post("/api/payroll/preview", payload).await
    }

    pub async fn generate_payroll(&self, payload: &GeneratePayrollPayload) -> ClientResult<SavedPayroll> {
        self.post("/api/payroll", payload).await
    }

    pub async fn list_payroll(&self, period: Option<(NaiveDate, NaiveDate)>) -> ClientResult<Vec<PayrollRecord>> {
        match period {
            Some((start, end)) => {
                self.get_with("/api/payroll", &[("period_start", start), ("period_end", end)])
                    .await
            }
            None => self.get("/api/payroll").await,
        }
    }

    pub async fn update_payroll_adjustments(
        &self,
        id: i64,
        payload: &AdjustmentsPayload,
    ) -> ClientResult<PayrollRecord> {
        self.put(&format!("/api/payroll/{id}/adjustments"), payload)
            .await
    }

    pub async fn mark_payroll_paid(&self, id: i64) -> ClientResult<PayrollRecord> {
        self.patch::<_, ()>(&format!("/api/payroll/{id}/pay"), None)
            .await
    }

    // --- Training and discipline ---

    pub async fn list_trainings(&self) -> ClientResult<Vec<TrainingProgram>> {
        self.get("/api/training").await
    }

    pub async fn create_training(&self, payload: &TrainingPayload) -> ClientResult<TrainingProgram> {
        self.post("/api/training", payload).await
    }

    pub async fn enroll(&self, training_id: i64, employee_ids: Vec<i64>) -> ClientResult<TrainingProgram> {
        self.post(
            &format!("/api/training/{training_id}/participants"),
            &EnrollPayload { employee_ids },
        )
        .await
    }

    pub async fn delete_training(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/training/{id}")).await
    }

    pub async fn list_cases(&self, employee_id: Option<i64>) -> ClientResult<Vec<DisciplinaryCase>> {
        self.get_with("/api/disciplinary-cases", &[("employee_id", employee_id)])
            .await
    }

    pub async fn create_case(&self, payload: &CasePayload) -> ClientResult<DisciplinaryCase> {
        self.post("/api/disciplinary-cases", payload).await
    }

    pub async fn close_case(
        &self,
        id: i64,
        status: CaseStatus,
        action_taken: Option<String>,
    ) -> ClientResult<DisciplinaryCase> {
        self.patch(
            &format!("/api/disciplinary-cases/{id}/status"),
            Some(&CaseStatusPayload {
                status,
                action_taken,
            }),
        )
        .await
    }
}
