// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::FromRef;
use common::LeaveDefaults;
use sqlx::SqlitePool;

/// Shared router state. Most handlers only need the pool and extract it directly.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub leave_defaults: LeaveDefaults,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            leave_defaults: LeaveDefaults::default(),
        }
    }

    pub fn with_leave_defaults(mut self, leave_defaults: LeaveDefaults) -> Self {
        self.leave_defaults = leave_defaults;
        self
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
