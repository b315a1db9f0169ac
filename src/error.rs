//! # Error Types
//!
//! Crate-level error type wrapping the per-boundary errors. Component boundaries
//! that the presentation layer calls (the orchestrator in particular) convert
//! these into values instead of returning them.

use crate::client::ClientError;
use crate::config::ConfigurationError;
use crate::registry::RegistryError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Task automation client error: {0}")]
    Client(#[from] ClientError),

    #[error("Client registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Event ingestion error: {0}")]
    Ingestion(String),
}

impl MonitorError {
    /// Create an ingestion error
    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion(message.into())
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
