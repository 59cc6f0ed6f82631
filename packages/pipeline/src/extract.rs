//! Rate-limited page extraction.
//!
//! Walks a source's result pages in order and yields records lazily.
//! Nothing is fetched until the stream is polled, and page N+1 is
//! only requested after every record of page N has been consumed.

use async_stream::stream;
use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::limiter::SourceLimiters;
use crate::source::JobSource;
use crate::types::config::SearchQuery;
use crate::types::job::RawRecord;

/// Streams raw records out of a job source, page by page.
///
/// The extractor owns no connection state of its own; it gates every
/// fetch through the shared per-source limiter and a per-fetch
/// deadline.
pub struct Extractor {
    source: Arc<dyn JobSource>,
    limiters: Arc<SourceLimiters>,
    fetch_timeout: Duration,
}

impl Extractor {
    pub fn new(
        source: Arc<dyn JobSource>,
        limiters: Arc<SourceLimiters>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            limiters,
            fetch_timeout,
        }
    }

    /// Stream records for a query across up to `max_pages` pages.
    ///
    /// The stream ends early when a page comes back empty (result set
    /// exhausted), when the token is cancelled, or after yielding a
    /// single terminal `Err`. It is not restartable; a caller that
    /// drops it mid-page re-fetches from page 1 on the next run.
    pub fn records(
        &self,
        query: SearchQuery,
        max_pages: u32,
        cancel: CancellationToken,
    ) -> impl Stream<Item = ExtractResult<RawRecord>> + '_ {
        stream! {
            for page in 1..=max_pages {
                // Both the limiter wait and the fetch are suspension
                // points; cancellation wins at either.
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(page = page, "extraction cancelled while waiting for rate limit");
                        return;
                    }
                    _ = self.limiters.acquire(self.source.id()) => {}
                }

                let fetch = tokio::time::timeout(
                    self.fetch_timeout,
                    self.source.fetch_page(&query, page),
                );
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(page = page, "extraction cancelled mid-fetch");
                        return;
                    }
                    outcome = fetch => outcome,
                };

                match outcome {
                    Err(_) => {
                        yield Err(ExtractError::Timeout(self.fetch_timeout));
                        return;
                    }
                    Ok(Err(e)) => {
                        yield Err(e);
                        return;
                    }
                    Ok(Ok(records)) => {
                        if records.is_empty() {
                            debug!(page = page, "result set exhausted");
                            return;
                        }
                        for record in records {
                            yield Ok(record);
                        }
                    }
                }
            }
        }
    }
}
