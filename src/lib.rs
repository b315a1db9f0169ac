#![allow(clippy::doc_markdown)] // Allow technical terms like ISO-8601, ARN in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batch Monitor Core
//!
//! Monitoring and remediation core for regional batch compute jobs.
//!
//! ## Overview
//!
//! Job state changes are appended to a record store by an ingester. This crate
//! reads that store back as a consistent "one record per job" view and runs
//! remediation actions (abort, mark broken, restart, restart and mark broken,
//! repair assembly) against a regional task-automation service.
//!
//! ## Architecture
//!
//! ```text
//! read path:  RecordStore -> LatestStateReducer -> fields -> presentation
//! write path: presentation -> ActionOrchestrator -> RegionClientRegistry -> TaskAutomationClient
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - Paginated record store boundary and in-memory store
//! - [`reducer`] - Latest-state reduction over the full record stream
//! - [`fields`] - Display field derivation from raw records
//! - [`client`] - Task-automation boundary and ambient configuration surface
//! - [`registry`] - Per-region client cache with guarded construction
//! - [`orchestration`] - Remediation actions with partial-failure reporting
//! - [`ingest`] - Job-state-change events to stored records
//! - [`service`] - Facade for the presentation layer
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup and helpers
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batch_monitor::client::InMemoryClientFactory;
//! use batch_monitor::config::MonitorConfig;
//! use batch_monitor::logging::init_structured_logging;
//! use batch_monitor::service::MonitoringService;
//! use batch_monitor::store::{InMemoryRecordStore, WriteMode};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::load()?;
//! init_structured_logging(&config.logging);
//!
//! let store = Arc::new(InMemoryRecordStore::new(
//!     config.table_name.clone(),
//!     config.store_region.clone(),
//!     WriteMode::History,
//! ));
//! let service = MonitoringService::from_config(&config, store, Arc::new(InMemoryClientFactory::new()));
//!
//! let stats = service.statistics().await?;
//! println!("{} jobs, {:.1}% succeeded", stats.total, stats.success_rate);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests, including property tests
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod fields;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod reducer;
pub mod registry;
pub mod service;
pub mod store;

pub use client::{
    AmbientConfig, ClientError, ClientFactory, ClientSettings, LaunchRequest, TaskAutomationClient,
};
pub use config::{ConfigurationError, LoggingConfig, MonitorConfig};
pub use constants::JobStatus;
pub use error::{MonitorError, Result};
pub use fields::{derive_task_id, derive_task_type, derive_workspace_uid, JobFields, TaskType};
pub use ingest::{record_from_event, BatchJobEvent, EventIngestor};
pub use models::{
    ActionKind, ActionStep, JobRecord, JobStatistics, LatestJobView, RecordFilter,
    RemediationAction, RemediationOutcome, RemediationResult, StepResult,
};
pub use orchestration::ActionOrchestrator;
pub use reducer::{reduce, reduce_store, LatestStateReducer};
pub use registry::{Availability, RegionClientRegistry, RegistryError, RegistryStats};
pub use service::MonitoringService;
pub use store::{RecordStore, StoreError};
