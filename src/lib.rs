pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod health;
pub mod provider;
pub mod services;
pub mod startup;
pub mod validation;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::provider::TppClient;
use crate::services::{CommissionService, PurchaseService, TransactionLedger, WalletService};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub provider: TppClient,
    pub wallets: WalletService,
    pub commissions: CommissionService,
    pub ledger: TransactionLedger,
    pub purchases: PurchaseService,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, provider: TppClient, sms_sender_id: String) -> Self {
        let wallets = WalletService::new(db.clone());
        let commissions = CommissionService::new(db.clone());
        let ledger = TransactionLedger::new(db.clone());
        let purchases = PurchaseService::new(
            db.clone(),
            provider.clone(),
            wallets.clone(),
            commissions.clone(),
            ledger.clone(),
            sms_sender_id,
        );

        Self {
            db,
            provider,
            wallets,
            commissions,
            ledger,
            purchases,
            start_time: Instant::now(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/purchases/airtime", post(handlers::purchases::purchase_airtime))
        .route(
            "/purchases/databundle",
            post(handlers::purchases::purchase_data_bundle),
        )
        .route("/wallets/:party_id/balance", get(handlers::wallets::get_balance))
        .route(
            "/wallets/:party_id/movements",
            get(handlers::wallets::list_movements),
        )
        .route(
            "/parties/:party_id/transactions",
            get(handlers::transactions::list_for_party),
        )
        .route(
            "/transactions/:reference",
            get(handlers::transactions::get_by_reference),
        )
        .route("/catalog/databundles", get(handlers::catalog::list_bundles))
        .route("/admin/fund", post(handlers::admin::fund_vendor))
        .route(
            "/admin/wallets/:party_id/adjust",
            post(handlers::admin::adjust_wallet),
        )
        .route(
            "/admin/vendors/:vendor_id/commission",
            put(handlers::admin::set_commission).get(handlers::admin::get_commission),
        )
        .route("/admin/transactions", get(handlers::admin::list_transactions))
        .route("/admin/provider/balance", get(handlers::admin::provider_balance))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
