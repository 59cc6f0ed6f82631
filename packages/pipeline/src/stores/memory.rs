//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::store::{ConfigStore, JobStore, UpsertOutcome};
use crate::types::config::SearchConfig;
use crate::types::job::CanonicalJob;

/// In-memory store for configs and jobs.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart. Failure injection flags let tests
/// exercise the pipeline's storage fault paths.
pub struct MemoryStore {
    configs: RwLock<HashMap<Uuid, SearchConfig>>,
    jobs: RwLock<HashMap<(Uuid, String), CanonicalJob>>,
    fail_configs: AtomicBool,
    fail_jobs: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            configs: RwLock::new(HashMap::new()),
            jobs: RwLock::new(HashMap::new()),
            fail_configs: AtomicBool::new(false),
            fail_jobs: AtomicBool::new(false),
        }
    }

    /// Add a search config.
    pub fn add_config(&self, config: SearchConfig) {
        self.configs.write().unwrap().insert(config.id, config);
    }

    /// Get a config by id.
    pub fn config(&self, id: Uuid) -> Option<SearchConfig> {
        self.configs.read().unwrap().get(&id).cloned()
    }

    /// Get the number of stored jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    /// Get all jobs belonging to one tenant.
    pub fn jobs_for_owner(&self, owner_id: Uuid) -> Vec<CanonicalJob> {
        self.jobs
            .read()
            .unwrap()
            .values()
            .filter(|j| j.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Replace a stored job row, e.g. to simulate a tenant status edit.
    pub fn put_job(&self, job: CanonicalJob) {
        self.jobs
            .write()
            .unwrap()
            .insert((job.owner_id, job.dedup_hash.clone()), job);
    }

    /// Make every config operation fail with `Unavailable`.
    pub fn fail_configs(&self, fail: bool) {
        self.fail_configs.store(fail, Ordering::SeqCst);
    }

    /// Make every job write fail with `Unavailable`.
    pub fn fail_jobs(&self, fail: bool) {
        self.fail_jobs.store(fail, Ordering::SeqCst);
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.configs.write().unwrap().clear();
        self.jobs.write().unwrap().clear();
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn fetch_active(&self) -> StorageResult<Vec<SearchConfig>> {
        if self.fail_configs.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store offline".into()));
        }
        let mut configs: Vec<_> = self
            .configs
            .read()
            .unwrap()
            .values()
            .filter(|c| c.active)
            .cloned()
            .collect();
        // Stable order keeps test assertions simple
        configs.sort_by_key(|c| c.id);
        Ok(configs)
    }

    async fn touch_last_run(&self, config_id: Uuid, at: DateTime<Utc>) -> StorageResult<()> {
        if self.fail_configs.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store offline".into()));
        }
        if let Some(config) = self.configs.write().unwrap().get_mut(&config_id) {
            config.last_run_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn upsert_job(&self, job: &CanonicalJob) -> StorageResult<UpsertOutcome> {
        if self.fail_jobs.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store offline".into()));
        }
        let mut jobs = self.jobs.write().unwrap();
        let key = (job.owner_id, job.dedup_hash.clone());
        if jobs.contains_key(&key) {
            return Ok(UpsertOutcome::AlreadyExists);
        }
        jobs.insert(key, job.clone());
        Ok(UpsertOutcome::Inserted)
    }
}
