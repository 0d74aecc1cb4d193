use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::db::queries;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(party_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    queries::find_party(&state.db, party_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("party {} not found", party_id)))?;

    let wallet = state.wallets.get_or_create(party_id).await?;

    Ok(Json(json!({
        "party_id": party_id,
        "balance": wallet.balance,
        "updated_at": wallet.updated_at,
    })))
}

pub async fn list_movements(
    State(state): State<AppState>,
    Path(party_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let movements = state
        .wallets
        .movements(party_id, pagination.limit.unwrap_or(50))
        .await?;

    Ok(Json(json!({ "party_id": party_id, "movements": movements })))
}
