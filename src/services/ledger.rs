use bigdecimal::BigDecimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Transaction, TrxnStatus, TrxnType};
use crate::db::queries;
use crate::error::AppError;
use crate::validation;

/// Parameters for a new ledger entry. The reference is generated at insert
/// time and handed back on the returned row.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub party_id: Uuid,
    pub trxn_type: TrxnType,
    pub amount: BigDecimal,
    pub commission: Option<BigDecimal>,
    pub vendor_cost: Option<BigDecimal>,
    pub recipient: Option<String>,
    pub network_id: Option<i32>,
    pub bundle_plan_id: Option<String>,
    pub status: TrxnStatus,
}

/// Purchase-attempt records, independent of wallet mutation and keyed by a
/// globally unique reference.
#[derive(Clone)]
pub struct TransactionLedger {
    pool: PgPool,
}

impl TransactionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewTransaction) -> Result<Transaction, AppError> {
        validation::validate_amount(&new.amount)?;

        let tx = Transaction::new(
            new.party_id,
            new.trxn_type,
            new.amount,
            new.commission,
            new.vendor_cost,
            new.recipient,
            new.network_id,
            new.bundle_plan_id,
            new.status,
        );

        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
        // A collision on the unique reference index surfaces as
        // DuplicateReference through the sqlx error mapping.
        queries::insert_transaction(&mut conn, &tx).await
    }

    /// Drives a PENDING row to a terminal status. Calling this on an already
    /// terminal row is a no-op returning the stored row untouched, so repeat
    /// callers can never re-trigger settlement side effects.
    pub async fn update_status(
        &self,
        reference: &str,
        status: TrxnStatus,
        provider_response: Option<&serde_json::Value>,
    ) -> Result<Transaction, AppError> {
        if !status.is_terminal() {
            return Err(AppError::Validation(format!(
                "cannot transition a transaction back to {:?}",
                status
            )));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let updated =
            queries::mark_transaction_if_pending(&mut tx, reference, status, provider_response)
                .await?;
        tx.commit().await.map_err(AppError::Database)?;

        match updated {
            Some(row) => Ok(row),
            None => self.find_by_reference(reference).await,
        }
    }

    pub async fn record_provider_response(
        &self,
        reference: &str,
        provider_response: &serde_json::Value,
    ) -> Result<(), AppError> {
        queries::record_provider_response(&self.pool, reference, provider_response).await
    }

    pub async fn find_by_reference(&self, reference: &str) -> Result<Transaction, AppError> {
        queries::find_transaction_by_reference(&self.pool, reference)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("transaction {} not found", reference)))
    }

    pub async fn list_for_party(
        &self,
        party_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Transaction>, AppError> {
        queries::list_transactions_for_party(&self.pool, party_id, limit.clamp(1, 100)).await
    }

    pub async fn list_pending(&self, limit: i64) -> Result<Vec<Transaction>, AppError> {
        queries::list_pending_transactions(&self.pool, limit).await
    }

    pub async fn list_all(
        &self,
        status: Option<TrxnStatus>,
        party_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Transaction>, AppError> {
        queries::list_transactions(&self.pool, status, party_id, limit.clamp(1, 200)).await
    }
}
