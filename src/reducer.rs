//! # Latest-State Reducer
//!
//! Collapses the append-only record stream into one record per job id.
//!
//! The store returns pages in no particular order and a job's authoritative
//! record can sit on any page, so [`reduce_store`] always drains every page
//! before producing a view. A failed page fails the whole load; a partial view
//! would silently show stale states.
//!
//! For a fixed job id the record with the greatest ISO-8601 timestamp wins,
//! compared as strings. On equal timestamps the record seen last wins, which
//! for a store scan means the one from the later page.

use crate::logging::log_store_operation;
use crate::models::{JobRecord, LatestJobView, RecordFilter, ReductionStats};
use crate::store::{page_stream, RecordStore, StoreResult};
use futures::TryStreamExt;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Incremental reducer; feed records or pages, then call [`finish`](Self::finish)
#[derive(Debug, Default)]
pub struct LatestStateReducer {
    jobs: HashMap<String, JobRecord>,
    stats: ReductionStats,
}

impl LatestStateReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one record. Records without a job id or timestamp are counted and dropped.
    pub fn absorb(&mut self, record: JobRecord) {
        self.stats.records_seen += 1;

        if !record.is_well_formed() {
            self.stats.records_dropped += 1;
            return;
        }

        match self.jobs.entry(record.job_id.clone()) {
            Entry::Occupied(mut current) => {
                if record.supersedes(current.get()) {
                    current.insert(record);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }

    pub fn absorb_page<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = JobRecord>,
    {
        for record in records {
            self.absorb(record);
        }
    }

    /// Combine with a reducer fed from a later chunk of the same stream.
    /// `later` wins timestamp ties.
    pub fn merge(mut self, later: LatestStateReducer) -> Self {
        self.stats.records_seen += later.stats.records_seen;
        self.stats.records_dropped += later.stats.records_dropped;

        for (job_id, record) in later.jobs {
            match self.jobs.entry(job_id) {
                Entry::Occupied(mut current) => {
                    if record.supersedes(current.get()) {
                        current.insert(record);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
            }
        }

        self
    }

    pub fn stats(&self) -> ReductionStats {
        self.stats
    }

    pub fn finish(self) -> LatestJobView {
        if self.stats.records_dropped > 0 {
            debug!(
                records_seen = self.stats.records_seen,
                records_dropped = self.stats.records_dropped,
                "Dropped malformed job records during reduction"
            );
        }
        LatestJobView::from_parts(self.jobs, self.stats)
    }
}

/// Reduce an in-memory sequence of records
pub fn reduce<I>(records: I) -> LatestJobView
where
    I: IntoIterator<Item = JobRecord>,
{
    let mut reducer = LatestStateReducer::new();
    reducer.absorb_page(records);
    reducer.finish()
}

/// Drain every page of a store scan and reduce it
pub async fn reduce_store(
    store: &dyn RecordStore,
    filter: Option<RecordFilter>,
) -> StoreResult<LatestJobView> {
    let started = Instant::now();
    let mut pages = Box::pin(page_stream(store, filter));
    let mut reducer = LatestStateReducer::new();
    let mut page_count = 0usize;

    while let Some(page) = pages.try_next().await? {
        page_count += 1;
        reducer.absorb_page(page);
    }

    let view = reducer.finish();

    log_store_operation(
        "reduce_latest",
        Some(page_count),
        Some(view.stats().records_seen),
        "completed",
        Some(started.elapsed().as_millis() as u64),
    );

    Ok(view)
}
