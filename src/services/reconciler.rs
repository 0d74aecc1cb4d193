use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::db::models::{Transaction, TrxnStatus};
use crate::db::queries;
use crate::error::AppError;
use crate::provider::{ProviderResponse, TppClient};
use crate::services::settlement::{self, SettleResult};

/// What a status-query answer means for a stuck transaction. Unlike the
/// purchase path, an explicit status re-query that comes back neither
/// successful nor processing is a definitive failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Success,
    StillPending,
    Failed,
}

impl ReconcileOutcome {
    pub fn from_response(response: &ProviderResponse) -> Self {
        if response.is_success() {
            ReconcileOutcome::Success
        } else if response.is_processing() {
            ReconcileOutcome::StillPending
        } else {
            ReconcileOutcome::Failed
        }
    }
}

#[derive(Debug, Default)]
pub struct ReconcileStats {
    pub examined: usize,
    pub settled_success: usize,
    pub settled_failed: usize,
    pub still_pending: usize,
    pub errors: usize,
}

/// Background loop that drives stuck PENDING transactions to a terminal
/// state. Single task, sequential within a pass; provider latency dominates,
/// so there is nothing to win by parallelizing.
pub struct Reconciler {
    pool: PgPool,
    provider: TppClient,
    interval: Duration,
    batch_size: i64,
}

impl Reconciler {
    pub fn new(pool: PgPool, provider: TppClient, interval: Duration, batch_size: i64) -> Self {
        Self {
            pool,
            provider,
            interval,
            batch_size,
        }
    }

    /// Runs until the shutdown signal flips. An in-flight pass always
    /// finishes; only the next tick is abandoned.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "reconciler started");
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(stats) if stats.examined > 0 => {
                            info!(
                                examined = stats.examined,
                                success = stats.settled_success,
                                failed = stats.settled_failed,
                                still_pending = stats.still_pending,
                                errors = stats.errors,
                                "reconciliation pass complete"
                            );
                        }
                        Ok(_) => debug!("reconciliation pass found nothing pending"),
                        Err(err) => error!(error = %err, "reconciliation pass aborted"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("reconciler stopping");
                    break;
                }
            }
        }
    }

    /// One pass over the oldest pending transactions. A failure on one row
    /// never blocks the rest of the batch.
    pub async fn run_once(&self) -> Result<ReconcileStats, AppError> {
        let pending = queries::list_pending_transactions(&self.pool, self.batch_size).await?;

        let mut stats = ReconcileStats {
            examined: pending.len(),
            ..Default::default()
        };

        for trx in &pending {
            match self.reconcile_one(trx).await {
                Ok(ReconcileOutcome::Success) => stats.settled_success += 1,
                Ok(ReconcileOutcome::StillPending) => stats.still_pending += 1,
                Ok(ReconcileOutcome::Failed) => stats.settled_failed += 1,
                Err(err) => {
                    stats.errors += 1;
                    error!(
                        reference = %trx.reference,
                        error = %err,
                        "failed to reconcile transaction"
                    );
                }
            }
        }

        Ok(stats)
    }

    async fn reconcile_one(&self, trx: &Transaction) -> Result<ReconcileOutcome, AppError> {
        let response = self
            .provider
            .transaction_status(&trx.reference)
            .await
            .map_err(|err| AppError::ProviderUnavailable(err.to_string()))?;

        // Re-fetch right before acting: the orchestrator or an earlier pass
        // may have settled this reference while the query was in flight. The
        // settlement routines re-check again under a row lock.
        let current = queries::find_transaction_by_reference(&self.pool, &trx.reference)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("transaction {} vanished", trx.reference)))?;
        if current.status != TrxnStatus::Pending {
            debug!(reference = %trx.reference, "already settled, skipping");
            return Ok(ReconcileOutcome::StillPending);
        }

        let outcome = ReconcileOutcome::from_response(&response);
        match outcome {
            ReconcileOutcome::Success => {
                if let SettleResult::AlreadySettled =
                    settlement::settle_success(&self.pool, &trx.reference, &response.raw).await?
                {
                    debug!(reference = %trx.reference, "lost settlement race");
                }
            }
            ReconcileOutcome::StillPending => {
                queries::record_provider_response(&self.pool, &trx.reference, &response.raw)
                    .await?;
                debug!(reference = %trx.reference, "provider still processing");
            }
            ReconcileOutcome::Failed => {
                if let SettleResult::AlreadySettled =
                    settlement::settle_failure(&self.pool, &trx.reference, &response.raw).await?
                {
                    debug!(reference = %trx.reference, "lost settlement race");
                }
            }
        }

        Ok(outcome)
    }
}
