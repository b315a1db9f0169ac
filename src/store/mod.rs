//! # Record Store Boundary
//!
//! Paginated reads and writes against the append-only job record store. No
//! business logic lives here: the store returns pages in no particular order
//! and callers must exhaust pagination themselves (see [`scan_all`] and
//! [`page_stream`]).
//!
//! ## Usage
//!
//! ```rust
//! use batch_monitor::models::JobRecord;
//! use batch_monitor::store::{scan_all, InMemoryRecordStore, RecordStore, WriteMode};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryRecordStore::new("MonitoringToolTest", "eu-west-1", WriteMode::History);
//! store.put(JobRecord::new("job-1", "2024-12-24T10:00:00Z", "RUNNING")).await?;
//!
//! let records = scan_all(&store, None).await?;
//! assert_eq!(records.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod pagination;

pub use memory::{InMemoryRecordStore, WriteMode};
pub use pagination::{page_stream, scan_all};

use crate::models::{JobRecord, RecordFilter};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Record store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Record serialization error: {message}")]
    Serialization { message: String },

    #[error("Invalid page token: {token}")]
    InvalidPageToken { token: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Opaque continuation handed back by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    pub page_token: Option<PageToken>,
    pub filter: Option<RecordFilter>,
    /// Items examined per page; the store's own page size when `None`
    pub limit: Option<usize>,
}

impl ScanRequest {
    pub fn first_page(filter: Option<RecordFilter>) -> Self {
        Self {
            page_token: None,
            filter,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Request for the page following `token`, keeping filter and limit
    pub fn continue_from(&self, token: PageToken) -> Self {
        Self {
            page_token: Some(token),
            filter: self.filter.clone(),
            limit: self.limit,
        }
    }
}

/// One page of a scan. A filtered page may be empty while more pages remain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub records: Vec<JobRecord>,
    pub next_page_token: Option<PageToken>,
}

/// Result of a connection test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHealth {
    pub table_name: String,
    pub region: String,
    pub item_count: Option<usize>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read one page. Pages carry no ordering guarantee.
    async fn scan(&self, request: ScanRequest) -> StoreResult<ScanPage>;

    async fn get_by_key(&self, job_id: &str) -> StoreResult<Option<JobRecord>>;

    async fn put(&self, record: JobRecord) -> StoreResult<()>;

    /// All retained records for a job, oldest first.
    ///
    /// Stores keyed by job id alone keep only the current state, so the
    /// default is that single record.
    async fn history(&self, job_id: &str) -> StoreResult<Vec<JobRecord>> {
        Ok(self.get_by_key(job_id).await?.into_iter().collect())
    }

    async fn ping(&self) -> StoreResult<StoreHealth>;
}
