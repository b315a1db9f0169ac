//! # Latest Job View
//!
//! Deduplicated projection holding exactly one record (the most recent) per job id.
//! Built fresh by the reducer on every load; nothing here is cached across loads.

use crate::models::{JobRecord, RecordFilter};
use std::collections::HashMap;

/// Counters describing the reduction that produced a view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReductionStats {
    /// Every record offered to the reducer, malformed ones included
    pub records_seen: usize,
    /// Records without a job id or timestamp
    pub records_dropped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LatestJobView {
    jobs: HashMap<String, JobRecord>,
    stats: ReductionStats,
}

impl LatestJobView {
    pub(crate) fn from_parts(jobs: HashMap<String, JobRecord>, stats: ReductionStats) -> Self {
        Self { jobs, stats }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, job_id: &str) -> Option<&JobRecord> {
        self.jobs.get(job_id)
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.jobs.contains_key(job_id)
    }

    pub fn stats(&self) -> ReductionStats {
        self.stats
    }

    /// Records in no particular order
    pub fn records(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.values()
    }

    pub fn job_ids(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    /// Newest first; job id breaks timestamp ties so the order is stable
    pub fn sorted_by_recency(&self) -> Vec<&JobRecord> {
        let mut records: Vec<&JobRecord> = self.jobs.values().collect();
        records.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        records
    }

    pub fn filter<'a>(&'a self, filter: &'a RecordFilter) -> impl Iterator<Item = &'a JobRecord> {
        self.jobs.values().filter(move |record| filter.matches(record))
    }
}

impl IntoIterator for LatestJobView {
    type Item = (String, JobRecord);
    type IntoIter = std::collections::hash_map::IntoIter<String, JobRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(records: Vec<JobRecord>) -> LatestJobView {
        let jobs = records
            .into_iter()
            .map(|r| (r.job_id.clone(), r))
            .collect::<HashMap<_, _>>();
        LatestJobView::from_parts(jobs, ReductionStats::default())
    }

    #[test]
    fn test_sorted_by_recency_is_newest_first() {
        let view = view(vec![
            JobRecord::new("a", "2024-12-24T10:00:00Z", "RUNNING"),
            JobRecord::new("b", "2024-12-24T12:00:00Z", "FAILED"),
            JobRecord::new("c", "2024-12-24T11:00:00Z", "SUCCEEDED"),
        ]);

        let ids: Vec<&str> = view
            .sorted_by_recency()
            .into_iter()
            .map(|r| r.job_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_filter_applies_to_view() {
        let view = view(vec![
            JobRecord::new("a", "2024-12-24T10:00:00Z", "RUNNING"),
            JobRecord::new("b", "2024-12-24T12:00:00Z", "FAILED"),
        ]);

        let failed = RecordFilter::new().with_status("FAILED");
        let matched: Vec<&JobRecord> = view.filter(&failed).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].job_id, "b");
    }
}
