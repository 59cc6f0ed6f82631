//! Testing utilities including mock implementations.
//!
//! Useful for testing applications built on the pipeline without
//! making real network calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{ExtractError, ExtractResult};
use crate::source::JobSource;
use crate::types::config::SearchQuery;
use crate::types::job::RawRecord;

/// Record of a page fetch made against a mock source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFetch {
    pub keywords: String,
    pub page: u32,
}

/// A scripted job source for testing.
///
/// Pages are keyed by (keywords, page number). Unscripted pages come
/// back empty, which reads as result-set exhaustion to the extractor.
/// Clones share state, so tests can keep a handle for assertions
/// after moving the source into the pipeline.
#[derive(Clone, Default)]
pub struct MockSource {
    id: String,

    /// Scripted responses by (keywords, page)
    pages: Arc<RwLock<HashMap<(String, u32), ExtractResult<Vec<RawRecord>>>>>,

    /// Artificial latency per fetch
    fetch_delay: Arc<RwLock<Option<Duration>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<PageFetch>>>,

    /// Concurrency tracking
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockSource {
    /// Create a new mock source with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Script a page of records for a keywords string.
    pub fn with_page(self, keywords: impl Into<String>, page: u32, records: Vec<RawRecord>) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert((keywords.into(), page), Ok(records));
        self
    }

    /// Script a failure for a keywords string and page.
    pub fn with_failure(self, keywords: impl Into<String>, page: u32, error: ExtractError) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert((keywords.into(), page), Err(error));
        self
    }

    /// Delay every fetch, for timeout and concurrency tests.
    pub fn with_fetch_delay(self, delay: Duration) -> Self {
        *self.fetch_delay.write().unwrap() = Some(delay);
        self
    }

    /// Get all fetches made against this mock.
    pub fn calls(&self) -> Vec<PageFetch> {
        self.calls.read().unwrap().clone()
    }

    /// Total number of page fetches.
    pub fn pages_fetched(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// High-water mark of concurrent fetches.
    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

/// Decrements the in-flight counter even when a fetch future is
/// dropped mid-sleep by a timeout or cancellation.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobSource for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> ExtractResult<Vec<RawRecord>> {
        self.calls.write().unwrap().push(PageFetch {
            keywords: query.keywords.clone(),
            page,
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let delay = *self.fetch_delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.pages
            .read()
            .unwrap()
            .get(&(query.keywords.clone(), page))
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
