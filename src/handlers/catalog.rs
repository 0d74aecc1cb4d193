use axum::{
    extract::Query,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::catalog::{self, BundlePlanView};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub network_id: Option<i32>,
}

pub async fn list_bundles(
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, AppError> {
    let bundles: Vec<BundlePlanView> = match query.network_id {
        Some(network_id) => catalog::plans_for_network(network_id)
            .into_iter()
            .map(BundlePlanView::from)
            .collect(),
        None => catalog::DATA_BUNDLES.iter().map(BundlePlanView::from).collect(),
    };

    Ok(Json(json!({ "bundles": bundles })))
}
