pub mod admin;
pub mod catalog;
pub mod purchases;
pub mod transactions;
pub mod wallets;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::health::{check_health, PostgresChecker, ProviderChecker};
use crate::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let report = check_health(
        PostgresChecker::new(state.db.clone()),
        ProviderChecker::new(state.provider.clone()),
        state.start_time,
    )
    .await;

    let code = if report.status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (code, Json(report))
}
