//! Job source trait.

use async_trait::async_trait;

use crate::error::ExtractResult;
use crate::types::config::SearchQuery;
use crate::types::job::RawRecord;

/// A site that can be searched for job postings, one page at a time.
///
/// Implementations are dumb transcribers: they report what the page
/// says and leave cleanup to normalization. They never see tenant
/// identity, only the query.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Stable identifier for this source, e.g. `"linkedin"`.
    ///
    /// Keys both the per-source rate limiter and the dedup hash, so
    /// it must not change between runs.
    fn id(&self) -> &str;

    /// Fetch one result page. Pages are 1-based.
    ///
    /// An empty vec means the result set is exhausted; callers stop
    /// paging early rather than walking the full page budget.
    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> ExtractResult<Vec<RawRecord>>;
}
