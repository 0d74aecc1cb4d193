use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

pub async fn get_by_reference(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tx = state.ledger.find_by_reference(&reference).await?;
    Ok(Json(tx))
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
}

pub async fn list_for_party(
    State(state): State<AppState>,
    Path(party_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state
        .ledger
        .list_for_party(party_id, pagination.limit.unwrap_or(20))
        .await?;

    Ok(Json(json!({
        "party_id": party_id,
        "transactions": transactions,
    })))
}
