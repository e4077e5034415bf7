use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
};
use client::error::GENERIC_MESSAGE;
use client::{ApiClient, ClientError, Session, SessionUser};
use common::{EmployeePayload, LeaveStatus};
use serde_json::{Value, json};
use std::sync::Arc;

/// Serves `app` on an ephemeral local port and returns its base URL.
async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn signed_in_session() -> Arc<Session> {
    let session = Session::in_memory();
    session.sign_in(
        "secret-token".to_string(),
        SessionUser {
            id: 1,
            name: "HR Admin".to_string(),
            role: None,
        },
    );
    Arc::new(session)
}

/// A stand-in for the HR server answering each route with one fixed outcome.
fn fake_server() -> Router {
    Router::new()
        .route(
            "/api/employees",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth != "Bearer secret-token" {
                    return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthenticated." })));
                }
                (StatusCode::OK, Json(json!([])))
            })
            .post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "error": "The given data was invalid.",
                        "fields": { "first_name": ["This field is required."] }
                    })),
                )
            }),
        )
        .route(
            "/api/positions",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "error returned from database: no such table: positions" })),
                )
            }),
        )
        .route(
            "/api/leaves/{id}/status",
            patch(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({ "error": "Leave request 3 is Approved and cannot become Canceled." })),
                )
            }),
        )
        .route(
            "/api/holidays",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "UNIQUE constraint failed: holidays.holiday_date" })),
                )
            }),
        )
        .route(
            "/api/payroll",
            get(|| async { (StatusCode::NOT_FOUND, Json::<Value>(json!({ "error": "Not here." }))) }),
        )
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let base = spawn_server(fake_server()).await;
    let api = ApiClient::new(&base, signed_in_session()).unwrap();

    let employees = api.list_employees().await.unwrap();
    assert!(employees.is_empty());
    assert!(api.session().is_authenticated());
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let base = spawn_server(fake_server()).await;
    let session = Arc::new(Session::in_memory());
    session.sign_in(
        "expired".to_string(),
        SessionUser {
            id: 1,
            name: "HR Admin".to_string(),
            role: None,
        },
    );
    let api = ApiClient::new(&base, session.clone()).unwrap();

    let err = api.list_employees().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert!(!session.is_authenticated());
    assert_eq!(session.user(), None);
}

#[tokio::test]
async fn test_validation_errors_carry_fields() {
    let base = spawn_server(fake_server()).await;
    let api = ApiClient::new(&base, signed_in_session()).unwrap();

    let err = api
        .create_employee(&EmployeePayload::default())
        .await
        .unwrap_err();
    match &err {
        ClientError::Validation { message, fields } => {
            assert_eq!(message, "The given data was invalid.");
            assert_eq!(fields.fields()["first_name"], vec!["This field is required."]);
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
    assert!(err.fields().is_some());
}

#[tokio::test]
async fn test_server_and_database_messages_are_sanitized() {
    let base = spawn_server(fake_server()).await;
    let api = ApiClient::new(&base, signed_in_session()).unwrap();

    let err = api.list_positions().await.unwrap_err();
    assert!(matches!(&err, ClientError::Server(m) if m == GENERIC_MESSAGE));

    let holiday = common::HolidayPayload {
        holiday_date: chrono::NaiveDate::from_ymd_opt(2025, 12, 25).unwrap(),
        holiday_type: common::HolidayType::Regular,
        title: "Christmas Day".to_string(),
    };
    let err = api.create_holiday(&holiday).await.unwrap_err();
    assert_eq!(err.to_string(), GENERIC_MESSAGE);
}

#[tokio::test]
async fn test_conflict_and_not_found_keep_safe_messages() {
    let base = spawn_server(fake_server()).await;
    let api = ApiClient::new(&base, signed_in_session()).unwrap();

    let err = api.set_leave_status(3, LeaveStatus::Canceled).await.unwrap_err();
    assert!(
        matches!(&err, ClientError::Conflict(m) if m == "Leave request 3 is Approved and cannot become Canceled.")
    );

    let err = api.list_payroll(None).await.unwrap_err();
    assert!(matches!(&err, ClientError::NotFound(m) if m == "Not here."));
}
