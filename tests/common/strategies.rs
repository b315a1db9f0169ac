#![allow(dead_code)]

use batch_monitor::models::JobRecord;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Strategy for ISO-8601 timestamps with microsecond precision
pub fn timestamp_strategy() -> impl Strategy<Value = String> {
    (1u32..=28, 0u32..24, 0u32..60, 0u32..60, 0u32..1_000_000).prop_map(
        |(day, hour, minute, second, micros)| {
            format!("2024-12-{day:02}T{hour:02}:{minute:02}:{second:02}.{micros:06}Z")
        },
    )
}

/// Strategy for a small pool of job ids so jobs repeat across the stream
pub fn job_id_strategy() -> impl Strategy<Value = String> {
    (0u8..8).prop_map(|n| format!("job-{n}"))
}

/// Records where every (job id, timestamp) pair is distinct.
/// Each record's status is unique so tests can tell records apart.
pub fn distinct_history_strategy() -> impl Strategy<Value = Vec<JobRecord>> {
    prop::collection::btree_set((job_id_strategy(), timestamp_strategy()), 0..60).prop_map(
        |pairs: BTreeSet<(String, String)>| {
            pairs
                .into_iter()
                .enumerate()
                .map(|(i, (job_id, timestamp))| JobRecord::new(job_id, timestamp, format!("S{i}")))
                .collect()
        },
    )
}

/// The same records in two independent orders
pub fn shuffled_pair_strategy() -> impl Strategy<Value = (Vec<JobRecord>, Vec<JobRecord>)> {
    distinct_history_strategy().prop_flat_map(|records| {
        let first = Just(records.clone()).prop_shuffle();
        let second = Just(records).prop_shuffle();
        (first, second)
    })
}

/// Records with chunk lengths for splitting them into pages
pub fn chunked_history_strategy() -> impl Strategy<Value = (Vec<JobRecord>, Vec<usize>)> {
    (
        distinct_history_strategy().prop_flat_map(|records| Just(records).prop_shuffle()),
        prop::collection::vec(1usize..12, 1..10),
    )
}

/// Well-formed records mixed with records missing a job id or timestamp
pub fn mixed_quality_strategy() -> impl Strategy<Value = Vec<JobRecord>> {
    let malformed = prop_oneof![
        timestamp_strategy().prop_map(|ts| JobRecord::new("", ts, "RUNNING")),
        job_id_strategy().prop_map(|id| JobRecord::new(id, "", "RUNNING")),
    ];
    (
        distinct_history_strategy(),
        prop::collection::vec(malformed, 0..10),
    )
        .prop_flat_map(|(mut records, bad)| {
            records.extend(bad);
            Just(records).prop_shuffle()
        })
}

/// Reference answer: greatest timestamp per job among well-formed records
pub fn expected_latest(records: &[JobRecord]) -> BTreeMap<String, JobRecord> {
    let mut latest: BTreeMap<String, JobRecord> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_well_formed()) {
        let replace = latest
            .get(&record.job_id)
            .map_or(true, |current| record.timestamp > current.timestamp);
        if replace {
            latest.insert(record.job_id.clone(), record.clone());
        }
    }
    latest
}

/// Strategy for page sizes of the in-memory store
pub fn page_size_strategy() -> impl Strategy<Value = usize> {
    1usize..=10
}
