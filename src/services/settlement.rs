use bigdecimal::{BigDecimal, Zero};
use sqlx::PgPool;

use crate::db::models::{Transaction, TrxnStatus};
use crate::db::queries;
use crate::error::AppError;
use crate::services::wallet::WalletService;

/// Outcome of a settlement attempt. `AlreadySettled` means another path
/// (the orchestrator or a concurrent reconciliation pass) got there first
/// and no wallet adjustment was made.
#[derive(Debug)]
pub enum SettleResult {
    Settled(Transaction),
    AlreadySettled,
}

/// Marks the transaction SUCCESS and routes the recorded commission to the
/// platform account, all in one database transaction. The principal was
/// already debited when the purchase was created and is never touched here.
///
/// The row lock plus the PENDING re-check make this idempotent: exactly one
/// caller per reference ever performs the adjustment.
pub async fn settle_success(
    pool: &PgPool,
    reference: &str,
    provider_response: &serde_json::Value,
) -> Result<SettleResult, AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Database)?;

    let row = queries::lock_transaction_by_reference(&mut tx, reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("transaction {} not found", reference)))?;

    if row.status != TrxnStatus::Pending {
        tx.rollback().await.map_err(AppError::Database)?;
        return Ok(SettleResult::AlreadySettled);
    }

    let updated = queries::mark_transaction_if_pending(
        &mut tx,
        reference,
        TrxnStatus::Success,
        Some(provider_response),
    )
    .await?
    .ok_or_else(|| {
        AppError::Internal(format!("lost row lock while settling {}", reference))
    })?;

    if let Some(commission) = &row.commission {
        if commission > &BigDecimal::zero() {
            match queries::find_platform_account(&mut tx).await? {
                Some(platform) => {
                    queries::get_or_create_wallet(&mut tx, platform.id).await?;
                    WalletService::credit_on(
                        &mut tx,
                        platform.id,
                        commission,
                        &format!("Commission {}", reference),
                    )
                    .await?;
                }
                None => {
                    tracing::warn!(
                        reference,
                        "no platform account configured, commission not routed"
                    );
                }
            }
        }
    }

    tx.commit().await.map_err(AppError::Database)?;

    tracing::info!(reference, "transaction settled SUCCESS");
    Ok(SettleResult::Settled(updated))
}

/// Marks the transaction FAILED and credits the debited amount back to the
/// owner: the delivery never happened, so funds must not stay withheld.
pub async fn settle_failure(
    pool: &PgPool,
    reference: &str,
    provider_response: &serde_json::Value,
) -> Result<SettleResult, AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Database)?;

    let row = queries::lock_transaction_by_reference(&mut tx, reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("transaction {} not found", reference)))?;

    if row.status != TrxnStatus::Pending {
        tx.rollback().await.map_err(AppError::Database)?;
        return Ok(SettleResult::AlreadySettled);
    }

    let updated = queries::mark_transaction_if_pending(
        &mut tx,
        reference,
        TrxnStatus::Failed,
        Some(provider_response),
    )
    .await?
    .ok_or_else(|| {
        AppError::Internal(format!("lost row lock while settling {}", reference))
    })?;

    if let Some(refund) = &row.vendor_cost {
        if refund > &BigDecimal::zero() {
            queries::get_or_create_wallet(&mut tx, row.party_id).await?;
            WalletService::credit_on(
                &mut tx,
                row.party_id,
                refund,
                &format!("Refund {}", reference),
            )
            .await?;
        }
    }

    tx.commit().await.map_err(AppError::Database)?;

    tracing::info!(reference, "transaction settled FAILED, funds refunded");
    Ok(SettleResult::Settled(updated))
}
