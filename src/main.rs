use clap::Parser;
use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use topup_core::cli::{self, Cli, Commands, DbCommands};
use topup_core::config::Config;
use topup_core::services::{BalanceSyncJob, Reconciler};
use topup_core::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Check => cli::handle_check(&config).await,
        Commands::Reconcile => cli::handle_reconcile_once(&config).await,
        Commands::SyncBalance => cli::handle_sync_balance(&config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Db(DbCommands::Seed {
            email,
            name,
            balance,
        }) => cli::handle_db_seed(&config, &email, &name, &balance).await,
        Commands::Config => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let pool = db::create_pool(&config).await?;

    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let provider = cli::provider_from_config(&config);

    // Background tasks are owned here: one shutdown signal stops them all,
    // and each in-flight pass drains before the process exits.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reconciler = Reconciler::new(
        pool.clone(),
        provider.clone(),
        Duration::from_secs(config.reconciler_interval_secs),
        config.reconciler_batch_size,
    );
    let reconciler_handle = tokio::spawn(reconciler.run(shutdown_rx.clone()));

    let balance_sync_handle = config.balance_sync_interval_secs.map(|secs| {
        let job = BalanceSyncJob::new(pool.clone(), provider.clone());
        tokio::spawn(job.run(Duration::from_secs(secs), shutdown_rx.clone()))
    });

    let state = AppState::new(pool.clone(), provider, config.sms_sender_id.clone());
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = reconciler_handle.await;
    if let Some(handle) = balance_sync_handle {
        let _ = handle.await;
    }
    pool.close().await;
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
