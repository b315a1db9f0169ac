//! # Record Filter
//!
//! Conjunctive filters over job records. The record store applies them while
//! scanning; a `LatestJobView` applies them to already-reduced state.

use crate::models::JobRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Exact status match (`FAILED`, `RUNNING`, ...)
    pub status: Option<String>,
    /// Substring of the queue ARN
    pub queue_contains: Option<String>,
    /// Only records strictly newer than this instant
    pub updated_after: Option<DateTime<Utc>>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_queue_containing(mut self, fragment: impl Into<String>) -> Self {
        self.queue_contains = Some(fragment.into());
        self
    }

    pub fn updated_after(mut self, cutoff: DateTime<Utc>) -> Self {
        self.updated_after = Some(cutoff);
        self
    }

    /// Records from the last `hours` hours, measured from `now`
    pub fn within_last_hours(self, hours: i64, now: DateTime<Utc>) -> Self {
        self.updated_after(now - Duration::hours(hours))
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.queue_contains.is_none() && self.updated_after.is_none()
    }

    pub fn matches(&self, record: &JobRecord) -> bool {
        if let Some(status) = &self.status {
            if &record.status != status {
                return false;
            }
        }

        if let Some(fragment) = &self.queue_contains {
            if !record.job_queue.contains(fragment.as_str()) {
                return false;
            }
        }

        if let Some(cutoff) = self.updated_after {
            // Unparseable timestamps cannot be placed on the time axis.
            match record.parsed_timestamp() {
                Some(ts) if ts > cutoff => {}
                _ => return false,
            }
        }

        true
    }
}
