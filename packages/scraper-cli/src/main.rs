//! Scrape pipeline entry point.
//!
//! Runs one complete pass over every active search config and exits.
//! An external scheduler (cron, systemd timer) owns the cadence; this
//! binary only knows how to do a single run.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipeline::{LinkedInSource, Pipeline, PostgresStore};

mod config;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = Config::from_env()?;

    // Database setup
    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let store = Arc::new(
        PostgresStore::from_pool(pool)
            .await
            .context("failed to initialize storage")?,
    );

    let source = Arc::new(LinkedInSource::new());
    let pipeline = Pipeline::with_config(
        store.clone(),
        store,
        source,
        config.pipeline_config(),
    );

    // Ctrl-C ends the run cooperatively; in-flight writes drain
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
        signal_token.cancel();
    });

    let report = pipeline.run(&shutdown).await.context("scrape run failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize run report")?
    );

    Ok(())
}
