//! Multi-Tenant Job Scraping Pipeline
//!
//! Pulls job postings out of public job boards on behalf of many
//! tenants, normalizes them into canonical rows, and persists them
//! with per-tenant deduplication. The pipeline is source-agnostic:
//! anything that can page through search results behind the
//! [`JobSource`] trait can feed it.
//!
//! # Architecture
//!
//! ```text
//! ConfigStore ─► Pipeline ─► Extractor ─► JobSource (LinkedIn, ...)
//!                   │            │
//!                   │      SourceLimiters (per-source spacing)
//!                   │
//!                   ├─► canonicalize (normalize + dedup hash)
//!                   └─► JobStore (insert-if-absent per tenant)
//! ```
//!
//! One [`Pipeline::run`] call is one complete pass: fetch every active
//! search config, scrape each under a bounded worker pool, and return
//! a [`RunReport`] with a terminal outcome per config.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pipeline::{LinkedInSource, Pipeline, PipelineConfig};
//! use pipeline::stores::PostgresStore;
//! use tokio_util::sync::CancellationToken;
//!
//! let store = Arc::new(PostgresStore::new(&database_url).await?);
//! let pipeline = Pipeline::new(store.clone(), store, Arc::new(LinkedInSource::new()));
//! let report = pipeline.run(&CancellationToken::new()).await?;
//! ```
//!
//! # Modules
//!
//! - [`source`] - The `JobSource` capability trait
//! - [`sources`] - Source implementations (LinkedIn)
//! - [`extract`] - Rate-limited page walking as a record stream
//! - [`normalize`] - Canonicalization and dedup hashing
//! - [`store`] - Storage traits (`ConfigStore`, `JobStore`)
//! - [`stores`] - Storage implementations (memory, postgres)
//! - [`pipeline`] - The scrape orchestrator
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod extract;
pub mod limiter;
pub mod normalize;
pub mod pipeline;
pub mod source;
pub mod sources;
pub mod store;
pub mod stores;
pub mod testing;
pub mod types;

// Re-export core types at crate root
pub use error::{ExtractError, PipelineError, StorageError};
pub use extract::Extractor;
pub use limiter::SourceLimiters;
pub use normalize::canonicalize;
pub use pipeline::{Pipeline, PipelineConfig};
pub use source::JobSource;
pub use sources::LinkedInSource;
pub use store::{ConfigStore, JobStore, UpsertOutcome};
pub use stores::MemoryStore;
pub use types::{
    config::{ExperienceLevel, SearchConfig, SearchQuery},
    job::{CanonicalJob, JobStatus, RawRecord},
    report::{ConfigOutcome, RunReport, ScrapeOutcome},
};

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;
