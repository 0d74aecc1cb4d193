use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub provider_base_url: String,
    pub provider_api_key: String,
    pub provider_api_secret: String,
    pub provider_retailer: String,
    pub sms_sender_id: String,
    pub reconciler_interval_secs: u64,
    pub reconciler_batch_size: i64,
    /// When set, the provider float sync job runs on this interval.
    pub balance_sync_interval_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            provider_base_url: env::var("TPP_BASE_URL")
                .unwrap_or_else(|_| "https://tppgh.myone4all.com/api".to_string()),
            provider_api_key: env::var("TPP_API_KEY").unwrap_or_else(|_| "demo_key".to_string()),
            provider_api_secret: env::var("TPP_API_SECRET")
                .unwrap_or_else(|_| "demo_secret".to_string()),
            provider_retailer: env::var("TPP_RETAILER").unwrap_or_default(),
            sms_sender_id: env::var("SMS_SENDER_ID").unwrap_or_else(|_| "DataApp".to_string()),
            reconciler_interval_secs: env::var("RECONCILER_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("RECONCILER_INTERVAL_SECS must be an integer")?,
            reconciler_batch_size: env::var("RECONCILER_BATCH_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .context("RECONCILER_BATCH_SIZE must be an integer")?,
            balance_sync_interval_secs: match env::var("BALANCE_SYNC_INTERVAL_SECS") {
                Ok(raw) => Some(
                    raw.parse()
                        .context("BALANCE_SYNC_INTERVAL_SECS must be an integer")?,
                ),
                Err(_) => None,
            },
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.server_port == 0 {
            anyhow::bail!("SERVER_PORT must be greater than 0");
        }
        if self.reconciler_batch_size <= 0 {
            anyhow::bail!("RECONCILER_BATCH_SIZE must be greater than 0");
        }

        url::Url::parse(&self.provider_base_url).context("TPP_BASE_URL is not a valid URL")?;

        Ok(())
    }
}
