//! Scrape orchestration across tenant search configs.
//!
//! One run: fetch every active config, scrape each under a bounded
//! worker pool, classify each config's terminal state, and return a
//! report. A failing config never takes its siblings down; only an
//! unreachable config store aborts the run.

use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, StorageError};
use crate::extract::Extractor;
use crate::limiter::SourceLimiters;
use crate::normalize::canonicalize;
use crate::source::JobSource;
use crate::store::{ConfigStore, JobStore, UpsertOutcome};
use crate::types::config::SearchConfig;
use crate::types::report::{ConfigOutcome, RunReport, ScrapeOutcome};

/// Tuning knobs for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum configs scraped at once
    pub max_concurrency: usize,
    /// Deadline for a single page fetch
    pub fetch_timeout: Duration,
    /// Deadline for a single job write
    pub storage_timeout: Duration,
    /// Minimum spacing between requests to one source
    pub source_spacing: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            fetch_timeout: Duration::from_secs(30),
            storage_timeout: Duration::from_secs(10),
            source_spacing: Duration::from_secs(2),
        }
    }
}

impl PipelineConfig {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_storage_timeout(mut self, storage_timeout: Duration) -> Self {
        self.storage_timeout = storage_timeout;
        self
    }

    pub fn with_source_spacing(mut self, source_spacing: Duration) -> Self {
        self.source_spacing = source_spacing;
        self
    }
}

/// Orchestrates scraping every active search config against a source.
///
/// The pipeline owns nothing durable itself; configs and jobs live in
/// the stores, and the source carries its own connection state. One
/// `run` call is one complete pass over the active configs.
pub struct Pipeline<C, J> {
    configs: Arc<C>,
    jobs: Arc<J>,
    source: Arc<dyn JobSource>,
    limiters: Arc<SourceLimiters>,
    config: PipelineConfig,
}

impl<C, J> Pipeline<C, J>
where
    C: ConfigStore + 'static,
    J: JobStore + 'static,
{
    /// Create a pipeline with default tuning.
    pub fn new(configs: Arc<C>, jobs: Arc<J>, source: Arc<dyn JobSource>) -> Self {
        Self::with_config(configs, jobs, source, PipelineConfig::default())
    }

    /// Create a pipeline with custom tuning.
    pub fn with_config(
        configs: Arc<C>,
        jobs: Arc<J>,
        source: Arc<dyn JobSource>,
        config: PipelineConfig,
    ) -> Self {
        let limiters = Arc::new(SourceLimiters::new(config.source_spacing));
        Self {
            configs,
            jobs,
            source,
            limiters,
            config,
        }
    }

    /// Run one scrape pass over every active config.
    ///
    /// The only error this returns is an unreachable config store;
    /// without the config list there is no work to fan out. Every
    /// other fault lands in that config's `ScrapeOutcome`.
    pub async fn run(&self, shutdown: &CancellationToken) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        let configs = self
            .configs
            .fetch_active()
            .await
            .map_err(PipelineError::ConfigFetch)?;

        info!(
            count = configs.len(),
            source = self.source.id(),
            "starting scrape run"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut handles = Vec::with_capacity(configs.len());
        for config in configs {
            let task = ScrapeTask {
                configs: self.configs.clone(),
                jobs: self.jobs.clone(),
                source: self.source.clone(),
                limiters: self.limiters.clone(),
                fetch_timeout: self.config.fetch_timeout,
                storage_timeout: self.config.storage_timeout,
            };
            let semaphore = semaphore.clone();
            let cancel = shutdown.child_token();
            let config_id = config.id;
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire().await.unwrap();
                task.scrape(config, cancel).await
            });
            handles.push((config_id, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (config_id, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(config_id = %config_id, error = %e, "scrape task crashed");
                    let mut outcome = ScrapeOutcome::new(config_id);
                    outcome.outcome = ConfigOutcome::Failed;
                    outcome.error = Some(format!("scrape task crashed: {e}"));
                    outcomes.push(outcome);
                }
            }
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        info!(
            configs = report.outcomes.len(),
            inserted = report.total_inserted(),
            duplicates = report.total_duplicate(),
            failed = report.count(ConfigOutcome::Failed),
            partial = report.count(ConfigOutcome::PartiallySucceeded),
            "scrape run finished"
        );

        Ok(report)
    }
}

/// Everything one spawned scrape needs, cloned out of the pipeline so
/// the task owns its state.
struct ScrapeTask<C, J> {
    configs: Arc<C>,
    jobs: Arc<J>,
    source: Arc<dyn JobSource>,
    limiters: Arc<SourceLimiters>,
    fetch_timeout: Duration,
    storage_timeout: Duration,
}

impl<C, J> ScrapeTask<C, J>
where
    C: ConfigStore,
    J: JobStore,
{
    /// Scrape a single config to its terminal state.
    async fn scrape(&self, config: SearchConfig, cancel: CancellationToken) -> ScrapeOutcome {
        let started = Instant::now();
        let mut outcome = ScrapeOutcome::new(config.id);
        let mut first_error: Option<String> = None;

        let extractor = Extractor::new(
            self.source.clone(),
            self.limiters.clone(),
            self.fetch_timeout,
        );
        let mut records =
            std::pin::pin!(extractor.records(config.query(), config.max_pages, cancel));

        while let Some(item) = records.next().await {
            let raw = match item {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(config_id = %config.id, error = %e, "extraction failed");
                    first_error.get_or_insert(e.to_string());
                    break;
                }
            };

            outcome.records_seen += 1;
            let Some(job) = canonicalize(&raw, config.owner_id) else {
                debug!(config_id = %config.id, url = %raw.url, "dropping malformed record");
                outcome.records_malformed += 1;
                continue;
            };

            let written =
                match tokio::time::timeout(self.storage_timeout, self.jobs.upsert_job(&job)).await
                {
                    Ok(written) => written,
                    Err(_) => Err(StorageError::Unavailable(format!(
                        "write exceeded {:?} deadline",
                        self.storage_timeout
                    ))),
                };

            match written {
                Ok(UpsertOutcome::Inserted) => outcome.records_inserted += 1,
                Ok(UpsertOutcome::AlreadyExists) => outcome.records_duplicate += 1,
                Err(e) => {
                    warn!(config_id = %config.id, error = %e, "failed to persist job");
                    first_error.get_or_insert(e.to_string());
                }
            }
        }

        // A config partially succeeds when something durable came out
        // of it before the fault; otherwise the fault is total.
        outcome.outcome = if first_error.is_none() {
            ConfigOutcome::Succeeded
        } else if outcome.records_inserted + outcome.records_duplicate > 0 {
            ConfigOutcome::PartiallySucceeded
        } else {
            ConfigOutcome::Failed
        };
        outcome.error = first_error;
        outcome.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            config_id = %config.id,
            outcome = ?outcome.outcome,
            seen = outcome.records_seen,
            inserted = outcome.records_inserted,
            duplicates = outcome.records_duplicate,
            malformed = outcome.records_malformed,
            duration_ms = outcome.duration_ms,
            "scrape finished"
        );

        // Recorded even on failure so the config is not rescheduled
        // as if it never ran.
        if let Err(e) = self.configs.touch_last_run(config.id, Utc::now()).await {
            warn!(config_id = %config.id, error = %e, "failed to record last run");
        }

        outcome
    }
}
