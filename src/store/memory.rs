//! # In-Memory Record Store
//!
//! Process-local store with the same contract as the hosted key/value table:
//! bounded pages, opaque continuation tokens, and a scan order unrelated to
//! insertion order or job id (items are spread by a hash of their key, so the
//! records of one job land on different pages).
//!
//! Two write modes mirror the two ingestion variants:
//! - `LatestOnly` keys items by job id; `put` overwrites the previous state.
//! - `History` keys items by job id and timestamp; every state change is kept.

use crate::models::JobRecord;
use crate::store::{
    PageToken, RecordStore, ScanPage, ScanRequest, StoreError, StoreHealth, StoreResult,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    LatestOnly,
    History,
}

/// Physical key; ordering by `spread` first scatters jobs across pages
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
struct ItemKey {
    spread: u64,
    job_id: String,
    sort_key: String,
}

impl ItemKey {
    fn for_record(mode: WriteMode, job_id: &str, timestamp: &str) -> Self {
        let sort_key = match mode {
            WriteMode::LatestOnly => String::new(),
            WriteMode::History => timestamp.to_string(),
        };

        let mut hasher = DefaultHasher::new();
        job_id.hash(&mut hasher);
        sort_key.hash(&mut hasher);

        Self {
            spread: hasher.finish(),
            job_id: job_id.to_string(),
            sort_key,
        }
    }

    fn to_token(&self) -> StoreResult<PageToken> {
        serde_json::to_string(self)
            .map(PageToken::new)
            .map_err(|e| StoreError::Serialization {
                message: e.to_string(),
            })
    }

    fn from_token(token: &PageToken) -> StoreResult<Self> {
        serde_json::from_str(token.as_str()).map_err(|_| StoreError::InvalidPageToken {
            token: token.as_str().to_string(),
        })
    }
}

#[derive(Debug)]
pub struct InMemoryRecordStore {
    table_name: String,
    region: String,
    mode: WriteMode,
    page_size: usize,
    items: RwLock<BTreeMap<ItemKey, JobRecord>>,
    unavailable: AtomicBool,
    scan_calls: AtomicUsize,
    fail_scans_after: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new(table_name: impl Into<String>, region: impl Into<String>, mode: WriteMode) -> Self {
        Self {
            table_name: table_name.into(),
            region: region.into(),
            mode,
            page_size: DEFAULT_PAGE_SIZE,
            items: RwLock::new(BTreeMap::new()),
            unavailable: AtomicBool::new(false),
            scan_calls: AtomicUsize::new(0),
            fail_scans_after: AtomicUsize::new(usize::MAX),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Number of `scan` calls served so far, failed ones included
    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::Acquire)
    }

    /// Simulate an outage of the whole store
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    /// Let `successful_scans` more scans through, then fail every later one
    pub fn fail_scans_after(&self, successful_scans: usize) {
        let served = self.scan_calls.load(Ordering::Acquire);
        self.fail_scans_after
            .store(served.saturating_add(successful_scans), Ordering::Release);
    }

    fn ensure_available(&self, operation: &str) -> StoreResult<()> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(StoreError::unavailable(format!(
                "{} unreachable during {operation}",
                self.table_name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn scan(&self, request: ScanRequest) -> StoreResult<ScanPage> {
        let call = self.scan_calls.fetch_add(1, Ordering::AcqRel);
        self.ensure_available("scan")?;
        if call >= self.fail_scans_after.load(Ordering::Acquire) {
            return Err(StoreError::unavailable(format!(
                "{} stopped answering after {call} pages",
                self.table_name
            )));
        }

        let start = match &request.page_token {
            Some(token) => Bound::Excluded(ItemKey::from_token(token)?),
            None => Bound::Unbounded,
        };
        let limit = request.limit.unwrap_or(self.page_size).max(1);

        let items = self.items.read();
        let examined: Vec<(&ItemKey, &JobRecord)> = items
            .range((start, Bound::Unbounded))
            .take(limit)
            .collect();

        // Like the hosted table, the filter runs after the page limit.
        let records = examined
            .iter()
            .map(|(_, record)| *record)
            .filter(|record| {
                request
                    .filter
                    .as_ref()
                    .map_or(true, |filter| filter.matches(record))
            })
            .cloned()
            .collect();

        let next_page_token = match examined.last() {
            Some((last_key, _)) if examined.len() == limit => {
                let has_more = items
                    .range((Bound::Excluded((*last_key).clone()), Bound::Unbounded))
                    .next()
                    .is_some();
                if has_more {
                    Some(last_key.to_token()?)
                } else {
                    None
                }
            }
            _ => None,
        };

        Ok(ScanPage {
            records,
            next_page_token,
        })
    }

    async fn get_by_key(&self, job_id: &str) -> StoreResult<Option<JobRecord>> {
        self.ensure_available("get_by_key")?;
        let items = self.items.read();

        let record = match self.mode {
            WriteMode::LatestOnly => items
                .get(&ItemKey::for_record(self.mode, job_id, ""))
                .cloned(),
            WriteMode::History => items
                .values()
                .filter(|record| record.job_id == job_id)
                .max_by(|a, b| a.timestamp.cmp(&b.timestamp))
                .cloned(),
        };

        Ok(record)
    }

    async fn put(&self, record: JobRecord) -> StoreResult<()> {
        self.ensure_available("put")?;
        let key = ItemKey::for_record(self.mode, &record.job_id, &record.timestamp);
        self.items.write().insert(key, record);
        Ok(())
    }

    async fn history(&self, job_id: &str) -> StoreResult<Vec<JobRecord>> {
        self.ensure_available("history")?;
        let mut records: Vec<JobRecord> = self
            .items
            .read()
            .values()
            .filter(|record| record.job_id == job_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(records)
    }

    async fn ping(&self) -> StoreResult<StoreHealth> {
        self.ensure_available("ping")?;
        Ok(StoreHealth {
            table_name: self.table_name.clone(),
            region: self.region.clone(),
            item_count: Some(self.len()),
        })
    }
}
