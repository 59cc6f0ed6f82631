//! Record normalization and dedup hashing.
//!
//! Turns a [`RawRecord`] into a [`CanonicalJob`] with a stable
//! identity hash. Two scrapes of the same posting must collapse to
//! the same hash even when the page varies casing, whitespace, or
//! tracking query params between visits.

use chrono::Utc;
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use crate::types::job::{CanonicalJob, JobStatus, RawRecord};

/// Query params that vary per visit without changing the posting.
const TRACKING_PARAMS: &[&str] = &["trk", "trackingid", "refid", "gclid", "fbclid"];

/// Normalize a raw record for one tenant.
///
/// Returns `None` when the record is unusable: a blank title or a URL
/// that does not parse. Everything else is cleaned up rather than
/// rejected.
pub fn canonicalize(record: &RawRecord, owner_id: Uuid) -> Option<CanonicalJob> {
    let title = collapse_whitespace(&record.title);
    if title.is_empty() {
        return None;
    }

    let url = canonical_url(&record.url)?;

    let company = collapse_whitespace(&record.company);
    let location = collapse_whitespace(&record.location);
    let dedup_hash = dedup_hash(&title, &company, &record.source, &url);

    Some(CanonicalJob {
        id: Uuid::new_v4(),
        owner_id,
        title,
        company,
        location,
        url: url.to_string(),
        source: record.source.clone(),
        posted_date: record
            .posted_date
            .as_deref()
            .map(collapse_whitespace)
            .filter(|d| !d.is_empty()),
        dedup_hash,
        status: JobStatus::New,
        scraped_at: Utc::now(),
    })
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse and clean a posting URL.
///
/// Drops the fragment and any tracking query params, keeps the rest
/// of the query intact. Returns `None` for unparsable URLs.
pub fn canonical_url(raw: &str) -> Option<Url> {
    let mut url = Url::parse(raw.trim()).ok()?;
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    Some(url)
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Compute the SHA-256 identity hash for a posting.
///
/// The hash covers the lowercased title, company, source id, and the
/// URL's origin and path. The query string is excluded entirely so
/// pagination and session params never split one posting into two.
pub fn dedup_hash(title: &str, company: &str, source: &str, url: &Url) -> String {
    let identity = format!(
        "{}|{}|{}|{}{}",
        title.to_lowercase(),
        company.to_lowercase(),
        source.to_lowercase(),
        url.origin().ascii_serialization().to_lowercase(),
        url.path().to_lowercase(),
    );

    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(title: &str, url: &str) -> RawRecord {
        RawRecord::new(title, "Acme Corp", "Berlin, Germany", url, "linkedin")
    }

    #[test]
    fn test_canonicalize_collapses_whitespace() {
        let raw = record("  Senior   Rust\n Engineer ", "https://example.com/jobs/42");
        let job = canonicalize(&raw, Uuid::new_v4()).unwrap();
        assert_eq!(job.title, "Senior Rust Engineer");
        assert_eq!(job.source, "linkedin");
        assert_eq!(job.status, JobStatus::New);
    }

    #[test]
    fn test_canonicalize_rejects_blank_title() {
        let raw = record("   \t ", "https://example.com/jobs/42");
        assert!(canonicalize(&raw, Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_canonicalize_rejects_bad_url() {
        let raw = record("Engineer", "not a url");
        assert!(canonicalize(&raw, Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_canonical_url_strips_tracking() {
        let url = canonical_url(
            "https://example.com/jobs/42?utm_source=feed&trk=search&id=7#apply",
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://example.com/jobs/42?id=7");
    }

    #[test]
    fn test_canonical_url_drops_empty_query() {
        let url = canonical_url("https://example.com/jobs/42?utm_campaign=x").unwrap();
        assert_eq!(url.as_str(), "https://example.com/jobs/42");
    }

    #[test]
    fn test_hash_ignores_case_and_tracking_params() {
        let owner = Uuid::new_v4();
        let a = canonicalize(
            &record("Rust Engineer", "https://example.com/jobs/42?utm_source=a"),
            owner,
        )
        .unwrap();
        let b = canonicalize(
            &record("RUST   engineer", "https://example.com/jobs/42?trk=b"),
            owner,
        )
        .unwrap();
        assert_eq!(a.dedup_hash, b.dedup_hash);
    }

    #[test]
    fn test_hash_ignores_query_entirely() {
        let a = canonical_url("https://example.com/jobs/42?id=7").unwrap();
        let b = canonical_url("https://example.com/jobs/42?id=8").unwrap();
        assert_eq!(
            dedup_hash("t", "c", "linkedin", &a),
            dedup_hash("t", "c", "linkedin", &b)
        );
    }

    #[test]
    fn test_hash_distinguishes_sources() {
        let url = canonical_url("https://example.com/jobs/42").unwrap();
        assert_ne!(
            dedup_hash("t", "c", "linkedin", &url),
            dedup_hash("t", "c", "indeed", &url)
        );
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let url = canonical_url("https://example.com/jobs/42").unwrap();
        let hash = dedup_hash("t", "c", "linkedin", &url);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    proptest! {
        #[test]
        fn prop_canonicalize_is_idempotent(title in "[A-Za-z ]{1,40}", company in "[A-Za-z ]{0,30}") {
            let owner = Uuid::new_v4();
            let raw = RawRecord::new(
                &title,
                &company,
                "Remote",
                "https://example.com/jobs/1",
                "linkedin",
            );
            if let Some(first) = canonicalize(&raw, owner) {
                let again = RawRecord::new(
                    &first.title,
                    &first.company,
                    &first.location,
                    &first.url,
                    &first.source,
                );
                let second = canonicalize(&again, owner).unwrap();
                prop_assert_eq!(first.dedup_hash, second.dedup_hash);
                prop_assert_eq!(first.title, second.title);
            }
        }

        #[test]
        fn prop_hash_ignores_surrounding_whitespace(pad_left in " {0,5}", pad_right in " {0,5}") {
            let owner = Uuid::new_v4();
            let clean = RawRecord::new(
                "Engineer",
                "Acme",
                "Berlin",
                "https://example.com/jobs/1",
                "linkedin",
            );
            let padded = RawRecord::new(
                format!("{pad_left}Engineer{pad_right}"),
                format!("{pad_left}Acme{pad_right}"),
                "Berlin",
                "https://example.com/jobs/1",
                "linkedin",
            );
            let a = canonicalize(&clean, owner).unwrap();
            let b = canonicalize(&padded, owner).unwrap();
            prop_assert_eq!(a.dedup_hash, b.dedup_hash);
        }
    }
}
