//! # TeamHub Worker
//!
//! Standalone process for the nightly project status refresh, for
//! deployments that run the API server without its embedded scheduler.
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/teamhub cargo run -p teamhub-worker
//! ```

use teamhub_shared::db::pool::{close_pool, create_pool, PoolSettings};
use teamhub_worker::config::WorkerConfig;
use teamhub_worker::scheduler::StatusScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WorkerConfig::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log.filter.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("TeamHub Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let pool = create_pool(PoolSettings {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    let scheduler = StatusScheduler::new(pool.clone(), config.scheduler.clone())?;
    let shutdown = scheduler.shutdown_token();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        shutdown.cancel();
    });

    scheduler.run().await;

    close_pool(pool).await;
    tracing::info!("Worker stopped");
    Ok(())
}
