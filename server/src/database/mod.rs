// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod attendance;
pub mod disciplinary;
pub mod employees;
pub mod holidays;
pub mod leaves;
pub mod payroll;
pub mod schedules;
pub mod training;

use anyhow::{Context, Result};
use sqlx::{Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::info;

/// Table definitions, applied in order at startup.
pub const SCHEMA: &[(&str, &str)] = &[
    (
        "positions",
        r#"
        CREATE TABLE IF NOT EXISTS positions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            monthly_salary REAL NOT NULL
        );
        "#,
    ),
    (
        "employees",
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            position_id INTEGER NULL,
            gender TEXT NULL,
            joining_date DATE NOT NULL,
            sss_number TEXT NULL,
            philhealth_number TEXT NULL,
            pagibig_number TEXT NULL,
            tin TEXT NULL,
            created_at TIMESTAMP NOT NULL,
            deleted_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    ),
    (
        "schedule_templates",
        r#"
        CREATE TABLE IF NOT EXISTS schedule_templates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL
        );
        "#,
    ),
    (
        "schedules",
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            schedule_date DATE NOT NULL,
            notes TEXT NULL,
            created_at TIMESTAMP NOT NULL
        );
        "#,
    ),
    (
        "schedule_assignments",
        r#"
        CREATE TABLE IF NOT EXISTS schedule_assignments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            schedule_id INTEGER NOT NULL,
            employee_id INTEGER NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            notes TEXT NULL,
            UNIQUE (schedule_id, employee_id)
        );
        "#,
    ),
    (
        "attendance_logs",
        r#"
        CREATE TABLE IF NOT EXISTS attendance_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL,
            log_date DATE NOT NULL,
            sign_in TEXT NULL,
            sign_out TEXT NULL,
            break_out TEXT NULL,
            break_in TEXT NULL,
            UNIQUE (employee_id, log_date)
        );
        "#,
    ),
    (
        "holidays",
        r#"
        CREATE TABLE IF NOT EXISTS holidays (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            holiday_date DATE NOT NULL UNIQUE,
            holiday_type TEXT NOT NULL,
            title TEXT NOT NULL
        );
        "#,
    ),
    (
        "leave_requests",
        r#"
        CREATE TABLE IF NOT EXISTS leave_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL,
            leave_type TEXT NOT NULL,
            date_from DATE NOT NULL,
            date_to DATE NOT NULL,
            days INTEGER NOT NULL,
            status TEXT NOT NULL,
            reason TEXT NULL,
            solo_parent BOOLEAN NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL
        );
        "#,
    ),
    (
        "leave_credits",
        r#"
        CREATE TABLE IF NOT EXISTS leave_credits (
            employee_id INTEGER NOT NULL,
            leave_type TEXT NOT NULL,
            year INTEGER NOT NULL,
            allotted_days INTEGER NOT NULL,
            PRIMARY KEY (employee_id, leave_type, year)
        );
        "#,
    ),
    (
        "payroll_records",
        r#"
        CREATE TABLE IF NOT EXISTS payroll_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL,
            period_start DATE NOT NULL,
            period_end DATE NOT NULL,
            base_pay REAL NOT NULL,
            holiday_pay REAL NOT NULL,
            leave_pay REAL NOT NULL,
            total_gross REAL NOT NULL,
            earnings TEXT NOT NULL,
            deductions TEXT NOT NULL,
            allowances REAL NOT NULL DEFAULT 0,
            bonuses REAL NOT NULL DEFAULT 0,
            loan_repayment REAL NOT NULL DEFAULT 0,
            net_pay REAL NOT NULL,
            status TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            UNIQUE (employee_id, period_start, period_end)
        );
        "#,
    ),
    (
        "training_programs",
        r#"
        CREATE TABLE IF NOT EXISTS training_programs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NULL,
            start_date DATE NOT NULL,
            end_date DATE NOT NULL,
            created_at TIMESTAMP NOT NULL
        );
        "#,
    ),
    (
        "training_participants",
        r#"
        CREATE TABLE IF NOT EXISTS training_participants (
            training_id INTEGER NOT NULL,
            employee_id INTEGER NOT NULL,
            PRIMARY KEY (training_id, employee_id)
        );
        "#,
    ),
    (
        "disciplinary_cases",
        r#"
        CREATE TABLE IF NOT EXISTS disciplinary_cases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL,
            violation TEXT NOT NULL,
            description TEXT NULL,
            incident_date DATE NOT NULL,
            action_taken TEXT NULL,
            status TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL
        );
        "#,
    ),
];

/// Establishes the database connection pool.
/// If the database does not exist, it creates it, then makes sure every table exists.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// Creates any missing table. Safe to run on every start.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for (table, ddl) in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create '{table}' table"))?;
    }
    info!("{} tables are ready.", SCHEMA.len());
    Ok(())
}

/// True when the error chain holds a SQLite UNIQUE/PRIMARY KEY violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}
