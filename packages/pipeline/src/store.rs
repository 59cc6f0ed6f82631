//! Storage traits for search configs and job rows.
//!
//! The storage layer is split into focused traits:
//! - `ConfigStore`: which searches exist and when they last ran
//! - `JobStore`: deduplicated job rows

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StorageResult;
use crate::types::config::SearchConfig;
use crate::types::job::CanonicalJob;

/// Result of attempting to persist a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was written with status `New`.
    Inserted,

    /// A row with the same (owner, dedup hash) already exists. The
    /// existing row, including its status, is left untouched.
    AlreadyExists,
}

/// Store for tenant search configurations.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch every active config across all tenants.
    async fn fetch_active(&self) -> StorageResult<Vec<SearchConfig>>;

    /// Record that a config's scrape reached a terminal state.
    ///
    /// Called regardless of outcome so a failing config does not get
    /// rescheduled as if it never ran.
    async fn touch_last_run(&self, config_id: Uuid, at: DateTime<Utc>) -> StorageResult<()>;
}

/// Store for deduplicated job rows.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a job unless the tenant already has it.
    ///
    /// Uniqueness is on (owner_id, dedup_hash). The operation never
    /// updates an existing row; a re-scraped posting keeps whatever
    /// status the tenant gave it.
    async fn upsert_job(&self, job: &CanonicalJob) -> StorageResult<UpsertOutcome>;
}
