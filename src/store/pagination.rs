//! Pagination helpers that walk a store until it stops returning a page token.

use crate::logging::log_store_operation;
use crate::models::{JobRecord, RecordFilter};
use crate::store::{RecordStore, ScanRequest, StoreResult};
use futures::stream::{self, Stream, TryStreamExt};
use std::time::Instant;
use tracing::debug;

/// Stream of pages, ending after the page that carries no continuation token
pub fn page_stream<'a>(
    store: &'a dyn RecordStore,
    filter: Option<RecordFilter>,
) -> impl Stream<Item = StoreResult<Vec<JobRecord>>> + Send + 'a {
    stream::try_unfold(
        Some(ScanRequest::first_page(filter)),
        move |next: Option<ScanRequest>| async move {
            let Some(request) = next else {
                return Ok(None);
            };

            let page = store.scan(request.clone()).await?;
            let following = page
                .next_page_token
                .map(|token| request.continue_from(token));

            Ok(Some((page.records, following)))
        },
    )
}

/// Read every page of a scan into memory
pub async fn scan_all(
    store: &dyn RecordStore,
    filter: Option<RecordFilter>,
) -> StoreResult<Vec<JobRecord>> {
    let started = Instant::now();
    let mut pages = Box::pin(page_stream(store, filter));
    let mut records = Vec::new();
    let mut page_count = 0usize;

    while let Some(page) = pages.try_next().await? {
        page_count += 1;
        debug!(
            page = page_count,
            page_records = page.len(),
            total_records = records.len() + page.len(),
            "Scanned record page"
        );
        records.extend(page);
    }

    log_store_operation(
        "scan_all",
        Some(page_count),
        Some(records.len()),
        "completed",
        Some(started.elapsed().as_millis() as u64),
    );

    Ok(records)
}
