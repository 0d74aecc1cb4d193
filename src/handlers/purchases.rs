use axum::{extract::State, response::IntoResponse, Json};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::PurchaseRequest;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AirtimePayload {
    pub party_id: Uuid,
    pub network_id: i32,
    pub recipient: String,
    pub amount: BigDecimal,
}

pub async fn purchase_airtime(
    State(state): State<AppState>,
    Json(payload): Json<AirtimePayload>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .purchases
        .purchase_airtime(PurchaseRequest {
            party_id: payload.party_id,
            network_id: payload.network_id,
            recipient: payload.recipient,
            amount: payload.amount,
            bundle_plan_id: None,
        })
        .await?;

    Ok(Json(json!({
        "message": "Airtime purchase initiated",
        "reference": outcome.reference,
        "status": outcome.status,
    })))
}

#[derive(Debug, Deserialize)]
pub struct DataBundlePayload {
    pub party_id: Uuid,
    pub network_id: i32,
    pub recipient: String,
    pub plan_id: String,
    pub amount: BigDecimal,
}

pub async fn purchase_data_bundle(
    State(state): State<AppState>,
    Json(payload): Json<DataBundlePayload>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .purchases
        .purchase_data_bundle(PurchaseRequest {
            party_id: payload.party_id,
            network_id: payload.network_id,
            recipient: payload.recipient,
            amount: payload.amount,
            bundle_plan_id: Some(payload.plan_id),
        })
        .await?;

    Ok(Json(json!({
        "message": "Data bundle purchase initiated",
        "reference": outcome.reference,
        "status": outcome.status,
    })))
}
