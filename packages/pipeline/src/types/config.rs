//! Search configuration types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Experience level filter a tenant can attach to a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Internship,
    EntryLevel,
    Associate,
    MidSenior,
    Director,
    Executive,
}

impl ExperienceLevel {
    /// Stable string form used for storage columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internship => "internship",
            Self::EntryLevel => "entry_level",
            Self::Associate => "associate",
            Self::MidSenior => "mid_senior",
            Self::Director => "director",
            Self::Executive => "executive",
        }
    }

    /// Parse the storage string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "internship" => Some(Self::Internship),
            "entry_level" => Some(Self::EntryLevel),
            "associate" => Some(Self::Associate),
            "mid_senior" => Some(Self::MidSenior),
            "director" => Some(Self::Director),
            "executive" => Some(Self::Executive),
            _ => None,
        }
    }
}

/// A tenant-owned saved search.
///
/// Each config describes one recurring query against a job source.
/// The pipeline only ever sees configs with `active` set; toggling
/// and deletion belong to the tenant-facing surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Unique config id
    pub id: Uuid,

    /// Tenant that owns this search
    pub owner_id: Uuid,

    /// Free-text keywords, e.g. "rust backend engineer"
    pub keywords: String,

    /// Location filter, e.g. "Berlin" or "United States"
    pub location: String,

    /// Restrict results to remote positions
    pub remote_only: bool,

    /// Optional experience level filter
    pub experience: Option<ExperienceLevel>,

    /// How many result pages to walk, at least 1
    pub max_pages: u32,

    /// Inactive configs are skipped by scheduled runs
    pub active: bool,

    /// When this config last completed a scrape (success or not)
    pub last_run_at: Option<DateTime<Utc>>,
}

impl SearchConfig {
    /// Create an active config with a fresh id.
    pub fn new(owner_id: Uuid, keywords: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            keywords: keywords.into(),
            location: location.into(),
            remote_only: false,
            experience: None,
            max_pages: 2,
            active: true,
            last_run_at: None,
        }
    }

    /// Restrict to remote positions.
    pub fn remote_only(mut self) -> Self {
        self.remote_only = true;
        self
    }

    /// Set the experience level filter.
    pub fn with_experience(mut self, level: ExperienceLevel) -> Self {
        self.experience = Some(level);
        self
    }

    /// Set the page budget. Clamped to at least 1.
    pub fn with_max_pages(mut self, pages: u32) -> Self {
        self.max_pages = pages.max(1);
        self
    }

    /// Mark the config inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// The tenant-free query a job source receives.
    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            keywords: self.keywords.clone(),
            location: self.location.clone(),
            remote_only: self.remote_only,
            experience: self.experience,
        }
    }
}

/// The search parameters handed to a job source.
///
/// Deliberately excludes tenant identity and scheduling state so
/// sources stay ignorant of who is asking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: String,
    pub remote_only: bool,
    pub experience: Option<ExperienceLevel>,
}
