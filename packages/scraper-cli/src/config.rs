use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use pipeline::PipelineConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_db_connections: u32,
    pub max_concurrency: usize,
    pub source_spacing: Duration,
    pub fetch_timeout: Duration,
    pub storage_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_db_connections: env::var("MAX_DB_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("MAX_DB_CONNECTIONS must be a valid number")?,
            max_concurrency: env::var("SCRAPER_MAX_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("SCRAPER_MAX_CONCURRENCY must be a valid number")?,
            source_spacing: env::var("SCRAPER_SOURCE_SPACING_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .map(Duration::from_millis)
                .context("SCRAPER_SOURCE_SPACING_MS must be a valid number")?,
            fetch_timeout: env::var("SCRAPER_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map(Duration::from_secs)
                .context("SCRAPER_FETCH_TIMEOUT_SECS must be a valid number")?,
            storage_timeout: env::var("SCRAPER_STORAGE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map(Duration::from_secs)
                .context("SCRAPER_STORAGE_TIMEOUT_SECS must be a valid number")?,
        })
    }

    /// Pipeline tuning derived from the environment.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_max_concurrency(self.max_concurrency)
            .with_source_spacing(self.source_spacing)
            .with_fetch_timeout(self.fetch_timeout)
            .with_storage_timeout(self.storage_timeout)
    }
}
