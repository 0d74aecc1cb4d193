use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::db::queries;
use crate::error::AppError;
use crate::provider::TppClient;

/// Records the provider's float balance against the platform account for
/// visibility. Deliberately decoupled from vendor funding: funding is a pure
/// ledger transfer and never consults the float. The observed balance lands
/// in a log line and nowhere else; overwriting the wallet with it would break
/// the movement-replay invariant.
#[derive(Clone)]
pub struct BalanceSyncJob {
    pool: PgPool,
    provider: TppClient,
}

impl BalanceSyncJob {
    pub fn new(pool: PgPool, provider: TppClient) -> Self {
        Self { pool, provider }
    }

    pub async fn run_once(&self) -> Result<(), AppError> {
        let response = self
            .provider
            .balance()
            .await
            .map_err(|err| AppError::ProviderUnavailable(err.to_string()))?;

        let Some(float_balance) = response.balance() else {
            warn!("provider returned no balance field, skipping sync");
            return Ok(());
        };

        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
        match queries::find_platform_account(&mut conn).await? {
            Some(platform) => {
                let wallet = queries::get_or_create_wallet(&mut conn, platform.id).await?;
                info!(
                    platform = %platform.id,
                    provider_float = %float_balance,
                    platform_balance = %wallet.balance,
                    "provider float observed"
                );
            }
            None => warn!("no platform account configured, skipping balance sync"),
        }

        Ok(())
    }

    pub async fn run(self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "balance sync job started");
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.run_once().await {
                        error!(error = %err, "balance sync failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("balance sync job stopping");
                    break;
                }
            }
        }
    }
}
