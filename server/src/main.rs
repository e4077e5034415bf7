// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::http::HeaderName;
use chrono::{Datelike, Local};
use server::config::Config;
use server::state::AppState;
use server::{database, routes};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:?}", e);
            std::process::exit(1);
        }
    };

    let db_pool = match database::establish_connection_pool(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("Database connection was made successfully.");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect with the database: {:?}", e);
            std::process::exit(1);
        }
    };

    let rollover_pool = db_pool.clone();
    let leave_defaults = config.leave_defaults;
    let rollover_interval = config.rollover_interval;
    // Year of the last successful credit rollover. None until the first run,
    // so the current year is granted at startup.
    let last_rollover_year: Arc<Mutex<Option<i32>>> = Arc::new(Mutex::new(None));

    tokio::spawn(async move {
        let mut interval = time::interval(rollover_interval);

        loop {
            interval.tick().await;

            let current_year = Local::now().year();
            let mut last_year_guard = last_rollover_year.lock().await;

            if last_year_guard.is_none_or(|year| year < current_year) {
                tracing::info!(
                    "New year detected: {}, granting default leave credits.",
                    current_year
                );
                match database::leaves::rollover_credits_in_db(
                    &rollover_pool,
                    current_year,
                    leave_defaults,
                )
                .await
                {
                    Ok(count) => {
                        tracing::info!(
                            "Successfully granted {} leave credits for {}.",
                            count,
                            current_year
                        );
                        *last_year_guard = Some(current_year);
                    }
                    Err(e) => {
                        tracing::error!("Error during automatic credit rollover: {:?}", e);
                    }
                }
            } else {
                tracing::debug!(
                    "No new year yet. Current year: {}. Last rollover year: {:?}.",
                    current_year,
                    *last_year_guard
                );
            }
        }
    });

    let state = AppState::new(db_pool).with_leave_defaults(config.leave_defaults);
    let app_routes = routes::create_router(state);

    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("authorization"),
        ])
        .allow_origin(Any);

    let app = app_routes.layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("The server listens on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {:?}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {:?}", e);
        std::process::exit(1);
    }
}
