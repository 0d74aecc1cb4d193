use bigdecimal::BigDecimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::models::{MovementDirection, Wallet, WalletMovement};
use crate::db::queries;
use crate::error::AppError;
use crate::validation;

/// All balance mutation funnels through credit/debit here so the movement
/// log stays a complete record: replaying it rederives the balance exactly.
#[derive(Clone)]
pub struct WalletService {
    pool: PgPool,
}

impl WalletService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_or_create(&self, party_id: Uuid) -> Result<Wallet, AppError> {
        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
        queries::get_or_create_wallet(&mut conn, party_id).await
    }

    pub async fn balance(&self, party_id: Uuid) -> Result<BigDecimal, AppError> {
        let wallet = self.get_or_create(party_id).await?;
        Ok(wallet.balance)
    }

    pub async fn credit(
        &self,
        party_id: Uuid,
        amount: &BigDecimal,
        metadata: &str,
    ) -> Result<Wallet, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let wallet = Self::credit_on(&mut tx, party_id, amount, metadata).await?;
        tx.commit().await.map_err(AppError::Database)?;

        Ok(wallet)
    }

    pub async fn debit(
        &self,
        party_id: Uuid,
        amount: &BigDecimal,
        metadata: &str,
    ) -> Result<Wallet, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let wallet = Self::debit_on(&mut tx, party_id, amount, metadata).await?;
        tx.commit().await.map_err(AppError::Database)?;

        Ok(wallet)
    }

    /// Composable variants for callers that need the mutation inside a larger
    /// atomic unit (funding, settlement).
    pub async fn credit_on(
        conn: &mut PgConnection,
        party_id: Uuid,
        amount: &BigDecimal,
        metadata: &str,
    ) -> Result<Wallet, AppError> {
        validation::validate_amount(amount)?;
        queries::credit_wallet(conn, party_id, amount, metadata).await
    }

    pub async fn debit_on(
        conn: &mut PgConnection,
        party_id: Uuid,
        amount: &BigDecimal,
        metadata: &str,
    ) -> Result<Wallet, AppError> {
        validation::validate_amount(amount)?;
        queries::debit_wallet(conn, party_id, amount, metadata).await
    }

    pub async fn movements(
        &self,
        party_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WalletMovement>, AppError> {
        queries::list_movements(&self.pool, party_id, limit.clamp(1, 200)).await
    }

    /// Manual admin correction, funneled through the same primitives so the
    /// audit trail stays complete.
    pub async fn admin_adjust(
        &self,
        party_id: Uuid,
        amount: &BigDecimal,
        direction: MovementDirection,
        reason: &str,
    ) -> Result<Wallet, AppError> {
        match direction {
            MovementDirection::Credit => {
                self.credit(party_id, amount, &format!("Admin credit: {}", reason))
                    .await
            }
            MovementDirection::Debit => {
                self.debit(party_id, amount, &format!("Admin debit: {}", reason))
                    .await
            }
        }
    }
}
