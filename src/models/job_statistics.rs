//! # Job Statistics
//!
//! Headline counts computed from a latest-state view. Never stored; recomputed
//! from whatever view the caller just loaded.

use crate::constants::JobStatus;
use crate::models::{JobRecord, LatestJobView};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatistics {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Runnable, starting or running jobs
    pub running: usize,
    /// Percentage of succeeded jobs, `0.0` for an empty view
    pub success_rate: f64,
}

impl JobStatistics {
    pub fn from_view(view: &LatestJobView) -> Self {
        Self::from_records(view.records())
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a JobRecord>) -> Self {
        let mut stats = Self::default();

        for record in records {
            stats.total += 1;
            match record.job_status() {
                JobStatus::Succeeded => stats.succeeded += 1,
                JobStatus::Failed => stats.failed += 1,
                status if status.is_in_flight() => stats.running += 1,
                _ => {}
            }
        }

        if stats.total > 0 {
            stats.success_rate = stats.succeeded as f64 / stats.total as f64 * 100.0;
        }

        stats
    }
}
