//! Job record types - raw scrapes and canonical rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A job posting exactly as a source yielded it.
///
/// Fields carry whatever text the page had, untrimmed and uncased.
/// Normalization happens later so a source implementation stays a
/// dumb transcriber of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Job title as displayed
    pub title: String,

    /// Company name as displayed
    pub company: String,

    /// Location text as displayed
    pub location: String,

    /// Link to the posting
    pub url: String,

    /// Identifier of the source that yielded this record
    pub source: String,

    /// Posting date string if the page carried one; kept opaque
    /// because sources disagree on format
    pub posted_date: Option<String>,
}

impl RawRecord {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: location.into(),
            url: url.into(),
            source: source.into(),
            posted_date: None,
        }
    }

    /// Attach the posting date string.
    pub fn with_posted_date(mut self, date: impl Into<String>) -> Self {
        self.posted_date = Some(date.into());
        self
    }
}

/// Tenant-visible lifecycle of a stored job.
///
/// The pipeline writes `New` on first insert and never changes the
/// status afterwards; all transitions belong to the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    New,
    Applied,
    Thinking,
    Ignored,
}

impl JobStatus {
    /// Stable string form used for storage columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Applied => "applied",
            Self::Thinking => "thinking",
            Self::Ignored => "ignored",
        }
    }

    /// Parse the storage string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "applied" => Some(Self::Applied),
            "thinking" => Some(Self::Thinking),
            "ignored" => Some(Self::Ignored),
            _ => None,
        }
    }
}

/// A normalized job posting ready for storage.
///
/// The dedup hash is derived from normalized fields, so two scrapes
/// of the same posting collapse to one row per tenant regardless of
/// casing, whitespace, or tracking query params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalJob {
    /// Surrogate row id
    pub id: Uuid,

    /// Tenant this row belongs to
    pub owner_id: Uuid,

    /// Normalized job title
    pub title: String,

    /// Normalized company name
    pub company: String,

    /// Normalized location text
    pub location: String,

    /// Canonical posting URL (tracking params stripped)
    pub url: String,

    /// Identifier of the source that produced the record
    pub source: String,

    /// Posting date string if the source had one
    pub posted_date: Option<String>,

    /// SHA-256 identity hash, unique per (owner_id, dedup_hash)
    pub dedup_hash: String,

    /// Tenant-visible status
    pub status: JobStatus,

    /// When the pipeline first saw this posting
    pub scraped_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_builder() {
        let record = RawRecord::new(
            "Engineer",
            "Acme",
            "Berlin",
            "https://example.com/jobs/1",
            "linkedin",
        )
        .with_posted_date("2025-06-01");
        assert_eq!(record.source, "linkedin");
        assert_eq!(record.posted_date.as_deref(), Some("2025-06-01"));
    }

    #[test]
    fn test_job_status_round_trip() {
        for status in [
            JobStatus::New,
            JobStatus::Applied,
            JobStatus::Thinking,
            JobStatus::Ignored,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("archived"), None);
    }
}
