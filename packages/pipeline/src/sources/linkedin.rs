//! LinkedIn guest search source.
//!
//! Hits the public jobs-guest endpoint that backs the logged-out
//! search page. No JavaScript rendering, just HTTP + HTML parsing.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{ExtractError, ExtractResult};
use crate::source::JobSource;
use crate::types::config::{ExperienceLevel, SearchQuery};
use crate::types::job::RawRecord;

const SEARCH_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";

/// Source identifier stamped on every record this source yields.
const SOURCE_ID: &str = "linkedin";

/// Results per page on the guest endpoint.
const PAGE_SIZE: u32 = 25;

/// Client-side deadline per request; the endpoint stalls rather than
/// erroring when it throttles.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Job source backed by LinkedIn's guest search endpoint.
pub struct LinkedInSource {
    client: reqwest::Client,
    endpoint: Url,
    selectors: CardSelectors,
}

struct CardSelectors {
    item: Selector,
    link: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    date: Selector,
}

impl CardSelectors {
    fn new() -> Self {
        // Static selectors, parse failures are programming errors
        Self {
            item: Selector::parse("li").expect("valid selector"),
            link: Selector::parse(
                r#"a[data-tracking-control-name="public_jobs_jserp-result_search-card"]"#,
            )
            .expect("valid selector"),
            title: Selector::parse("h3.base-search-card__title").expect("valid selector"),
            company: Selector::parse("h4.base-search-card__subtitle").expect("valid selector"),
            location: Selector::parse("span.job-search-card__location").expect("valid selector"),
            date: Selector::parse("time.job-search-card__listdate").expect("valid selector"),
        }
    }
}

impl LinkedInSource {
    pub fn new() -> Self {
        // Browser-like headers to avoid bot detection
        let user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, "*/*".parse().unwrap());
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.9".parse().unwrap(),
        );
        headers.insert("sec-fetch-dest", "empty".parse().unwrap());
        headers.insert("sec-fetch-mode", "cors".parse().unwrap());
        headers.insert("sec-fetch-site", "same-origin".parse().unwrap());

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            endpoint: Url::parse(SEARCH_URL).expect("valid endpoint URL"),
            selectors: CardSelectors::new(),
        }
    }

    /// Point the source at a different endpoint. Used by tests to hit
    /// a local server instead of the live site.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Build the search URL for one result page.
    fn page_url(&self, query: &SearchQuery, page: u32) -> Url {
        let start = (page.saturating_sub(1)) * PAGE_SIZE;

        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("keywords", &query.keywords)
                .append_pair("location", &query.location)
                .append_pair("trk", "public_jobs_jobs-search-bar_search-submit")
                .append_pair("start", &start.to_string());

            if query.remote_only {
                pairs.append_pair("f_WT", "2");
            }
            if let Some(level) = query.experience {
                pairs.append_pair("f_E", experience_code(level));
            }
        }
        url
    }

    /// Parse one result page into raw records.
    ///
    /// Cards missing a title or company still yield a record with the
    /// field blank; normalization decides what is usable. A page with
    /// list items but no recognizable search cards means the markup
    /// changed under us.
    fn parse_page(&self, html: &str) -> ExtractResult<Vec<RawRecord>> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();
        let mut items = 0usize;

        for item in document.select(&self.selectors.item) {
            items += 1;

            // Only list items carrying the search-card link are jobs
            let Some(link) = item.select(&self.selectors.link).next() else {
                continue;
            };
            let url = link.value().attr("href").unwrap_or_default().to_string();

            let title = select_text(&item, &self.selectors.title);
            let company = select_text(&item, &self.selectors.company);
            let location = select_text(&item, &self.selectors.location);

            let mut record = RawRecord::new(title, company, location, url, SOURCE_ID);
            if let Some(date) = item
                .select(&self.selectors.date)
                .next()
                .and_then(|el| el.value().attr("datetime"))
            {
                record = record.with_posted_date(date);
            }

            records.push(record);
        }

        if records.is_empty() && items > 0 {
            return Err(ExtractError::LayoutMismatch(format!(
                "{items} list items but no recognizable job cards"
            )));
        }

        Ok(records)
    }
}

impl Default for LinkedInSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobSource for LinkedInSource {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> ExtractResult<Vec<RawRecord>> {
        let url = self.page_url(query, page);
        debug!(page = page, url = %url, "fetching search page");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractError::Timeout(REQUEST_TIMEOUT)
            } else {
                ExtractError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ExtractError::Blocked(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(ExtractError::Network(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        self.parse_page(&body)
    }
}

fn select_text(item: &ElementRef<'_>, selector: &Selector) -> String {
    item.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn experience_code(level: ExperienceLevel) -> &'static str {
    match level {
        ExperienceLevel::Internship => "1",
        ExperienceLevel::EntryLevel => "2",
        ExperienceLevel::Associate => "3",
        ExperienceLevel::MidSenior => "4",
        ExperienceLevel::Director => "5",
        ExperienceLevel::Executive => "6",
    }
}
