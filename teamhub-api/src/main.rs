//! # TeamHub API Server
//!
//! Serves the JSON API (`/api/v1`, bearer tokens) and the admin panel
//! (`/admin`, session cookie), and by default runs the nightly project
//! status refresh in-process.
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/teamhub JWT_SECRET=... cargo run -p teamhub-api
//! ```

use std::net::SocketAddr;
use teamhub_api::{
    app::{build_router, AppState},
    config::Config,
};
use teamhub_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, PoolSettings},
};
use teamhub_worker::scheduler::StatusScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log.filter.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        "TeamHub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(PoolSettings {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        acquire_timeout_seconds: config.database.acquire_timeout_seconds,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let scheduler = StatusScheduler::new(pool.clone(), config.scheduler.clone())?;
    let shutdown = scheduler.shutdown_token();

    let scheduler_task = if config.api.run_scheduler {
        let scheduler = scheduler.clone();
        Some(tokio::spawn(async move { scheduler.run().await }))
    } else {
        tracing::info!("Embedded status scheduler disabled");
        None
    };

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, scheduler));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    let signal = shutdown.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        signal.cancel();
    })
    .await?;

    shutdown.cancel();
    if let Some(task) = scheduler_task {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Scheduler task ended abnormally");
        }
    }

    close_pool(pool).await;
    tracing::info!("Server stopped");
    Ok(())
}
