//! Run reporting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal state of one config's scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigOutcome {
    /// Every page was walked and every usable record was persisted.
    Succeeded,

    /// Nothing usable was produced or persisted.
    Failed,

    /// Some records were persisted before an extraction or storage
    /// fault cut the scrape short.
    PartiallySucceeded,
}

/// What happened to a single search config during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    /// Config this outcome describes
    pub config_id: Uuid,

    /// Terminal state
    pub outcome: ConfigOutcome,

    /// Records the source yielded, usable or not
    pub records_seen: usize,

    /// New rows written
    pub records_inserted: usize,

    /// Records already present for this tenant
    pub records_duplicate: usize,

    /// Records dropped by normalization
    pub records_malformed: usize,

    /// First error observed, if any
    pub error: Option<String>,

    /// Wall-clock duration of the scrape in milliseconds
    pub duration_ms: u64,
}

impl ScrapeOutcome {
    /// Create an empty outcome for a config; counts accumulate as
    /// the scrape progresses.
    pub fn new(config_id: Uuid) -> Self {
        Self {
            config_id,
            outcome: ConfigOutcome::Succeeded,
            records_seen: 0,
            records_inserted: 0,
            records_duplicate: 0,
            records_malformed: 0,
            error: None,
            duration_ms: 0,
        }
    }
}

/// Summary of one full pipeline run across all active configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: DateTime<Utc>,

    /// Per-config outcomes, one entry per active config
    pub outcomes: Vec<ScrapeOutcome>,
}

impl RunReport {
    /// Check if every config succeeded outright.
    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.outcome == ConfigOutcome::Succeeded)
    }

    /// Total new rows written across all configs.
    pub fn total_inserted(&self) -> usize {
        self.outcomes.iter().map(|o| o.records_inserted).sum()
    }

    /// Total duplicates skipped across all configs.
    pub fn total_duplicate(&self) -> usize {
        self.outcomes.iter().map(|o| o.records_duplicate).sum()
    }

    /// Number of configs that ended in the given state.
    pub fn count(&self, outcome: ConfigOutcome) -> usize {
        self.outcomes.iter().filter(|o| o.outcome == outcome).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(state: ConfigOutcome, inserted: usize) -> ScrapeOutcome {
        let mut o = ScrapeOutcome::new(Uuid::new_v4());
        o.outcome = state;
        o.records_inserted = inserted;
        o
    }

    #[test]
    fn test_report_counts() {
        let report = RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcomes: vec![
                outcome(ConfigOutcome::Succeeded, 3),
                outcome(ConfigOutcome::Failed, 0),
                outcome(ConfigOutcome::PartiallySucceeded, 2),
            ],
        };

        assert!(!report.is_success());
        assert_eq!(report.total_inserted(), 5);
        assert_eq!(report.count(ConfigOutcome::Failed), 1);
        assert_eq!(report.count(ConfigOutcome::Succeeded), 1);
    }
}
