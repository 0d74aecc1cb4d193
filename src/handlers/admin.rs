use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::db::models::{MovementDirection, Role, TrxnStatus};
use crate::db::queries;
use crate::error::AppError;
use crate::AppState;

async fn ensure_admin(state: &AppState, party_id: Uuid) -> Result<(), AppError> {
    let party = queries::find_party(&state.db, party_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("party {} not found", party_id)))?;
    if party.role != Role::Admin {
        return Err(AppError::Forbidden(
            "only an admin can perform this action".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct FundPayload {
    pub admin_id: Uuid,
    pub vendor_id: Uuid,
    pub amount: BigDecimal,
}

pub async fn fund_vendor(
    State(state): State<AppState>,
    Json(payload): Json<FundPayload>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .purchases
        .fund_vendor(payload.admin_id, payload.vendor_id, &payload.amount)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Vendor funded successfully",
            "reference": record.reference,
            "amount": record.amount,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AdjustPayload {
    pub admin_id: Uuid,
    pub amount: BigDecimal,
    pub direction: MovementDirection,
    pub reason: String,
}

pub async fn adjust_wallet(
    State(state): State<AppState>,
    Path(party_id): Path<Uuid>,
    Json(payload): Json<AdjustPayload>,
) -> Result<impl IntoResponse, AppError> {
    ensure_admin(&state, payload.admin_id).await?;
    queries::find_party(&state.db, party_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("party {} not found", party_id)))?;

    state.wallets.get_or_create(party_id).await?;
    let wallet = state
        .wallets
        .admin_adjust(party_id, &payload.amount, payload.direction, &payload.reason)
        .await?;

    Ok(Json(json!({
        "message": "Wallet adjusted",
        "party_id": party_id,
        "balance": wallet.balance,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CommissionPayload {
    pub admin_id: Uuid,
    pub rate: BigDecimal,
    pub model: String,
}

pub async fn set_commission(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    Json(payload): Json<CommissionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let setting = state
        .purchases
        .set_commission(payload.admin_id, vendor_id, &payload.rate, &payload.model)
        .await?;

    Ok(Json(json!({
        "message": "Commission updated successfully",
        "commission": setting,
    })))
}

pub async fn get_commission(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let setting = state.purchases.get_commission(vendor_id).await?;
    Ok(Json(json!({ "commission": setting })))
}

#[derive(Debug, Deserialize)]
pub struct TransactionFilter {
    pub admin_id: Uuid,
    pub status: Option<TrxnStatus>,
    pub vendor_id: Option<Uuid>,
    pub limit: Option<i64>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, AppError> {
    ensure_admin(&state, filter.admin_id).await?;

    let transactions = state
        .ledger
        .list_all(filter.status, filter.vendor_id, filter.limit.unwrap_or(50))
        .await?;

    Ok(Json(json!({ "transactions": transactions })))
}

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub admin_id: Uuid,
}

pub async fn provider_balance(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<impl IntoResponse, AppError> {
    ensure_admin(&state, query.admin_id).await?;

    let response = state
        .provider
        .balance()
        .await
        .map_err(|err| AppError::ProviderUnavailable(err.to_string()))?;

    let balance = response.balance().ok_or_else(|| {
        AppError::ProviderAmbiguous("provider response carried no balance field".to_string())
    })?;

    Ok(Json(json!({
        "balance": balance,
        "raw": response.raw,
    })))
}
