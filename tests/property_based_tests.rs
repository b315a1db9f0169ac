mod common;

use batch_monitor::models::{JobRecord, LatestJobView};
use batch_monitor::reducer::{reduce, reduce_store, LatestStateReducer};
use batch_monitor::store::WriteMode;
use common::strategies::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn as_map(view: &LatestJobView) -> BTreeMap<String, JobRecord> {
    view.records()
        .map(|record| (record.job_id.clone(), record.clone()))
        .collect()
}

proptest! {
    /// Property: the view holds the greatest-timestamp record of every job
    #[test]
    fn reduce_keeps_latest_record_per_job(records in distinct_history_strategy()) {
        let view = reduce(records.clone());
        prop_assert_eq!(as_map(&view), expected_latest(&records));
    }

    /// Property: input order never changes the view
    #[test]
    fn reduce_is_permutation_invariant((first, second) in shuffled_pair_strategy()) {
        prop_assert_eq!(as_map(&reduce(first)), as_map(&reduce(second)));
    }

    /// Property: reducing chunks separately and merging equals reducing everything at once
    #[test]
    fn chunked_merge_matches_single_pass((records, chunk_lengths) in chunked_history_strategy()) {
        let mut remaining = records.as_slice();
        let mut merged = LatestStateReducer::new();
        let mut lengths = chunk_lengths.iter().cycle();

        while !remaining.is_empty() {
            let take = (*lengths.next().unwrap()).min(remaining.len());
            let (chunk, rest) = remaining.split_at(take);
            let mut reducer = LatestStateReducer::new();
            reducer.absorb_page(chunk.to_vec());
            merged = merged.merge(reducer);
            remaining = rest;
        }

        let merged = merged.finish();
        prop_assert_eq!(as_map(&merged), as_map(&reduce(records.clone())));
        prop_assert_eq!(merged.stats().records_seen, records.len());
    }

    /// Property: every job with a well-formed record appears, malformed records are only counted
    #[test]
    fn reduce_never_drops_a_well_formed_job(records in mixed_quality_strategy()) {
        let view = reduce(records.clone());
        let well_formed: Vec<&JobRecord> = records.iter().filter(|r| r.is_well_formed()).collect();

        for record in &well_formed {
            prop_assert!(view.contains(&record.job_id), "missing {}", record.job_id);
        }
        prop_assert_eq!(view.stats().records_dropped, records.len() - well_formed.len());
        prop_assert_eq!(view.len(), expected_latest(&records).len());
    }

    /// Property: page boundaries of a store scan never change the view
    #[test]
    fn store_reduction_is_page_size_invariant(
        records in distinct_history_strategy(),
        page_size in page_size_strategy(),
    ) {
        let store = tokio_test::block_on(common::seeded_store(records.clone(), WriteMode::History, page_size));
        let view = tokio_test::block_on(reduce_store(&*store, None)).unwrap();

        prop_assert_eq!(as_map(&view), expected_latest(&records));
    }
}

#[test]
fn reduce_of_empty_input_is_empty() {
    let view = reduce(Vec::new());
    assert!(view.is_empty());
    assert_eq!(view.stats().records_seen, 0);
}
