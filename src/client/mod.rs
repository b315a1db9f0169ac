//! # Task-Automation Client Boundary
//!
//! Everything the core needs from the remote task-automation service:
//!
//! - **TaskAutomationClient**: a handle bound to one region issuing task operations
//! - **ClientFactory**: builds a client from explicit [`ClientSettings`]
//! - **AmbientConfig**: the process-wide key/value surface some constructors read
//!   instead of taking parameters, plus the guard that overrides it safely
//! - **InMemoryTaskAutomation**: in-process backend for tests and demos
//!
//! ## Usage
//!
//! ```rust
//! use batch_monitor::client::{ClientFactory, ClientSettings, InMemoryClientFactory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = InMemoryClientFactory::new();
//! let client = factory
//!     .create_client(&ClientSettings::new("eu-west-1", "pre"))
//!     .await?;
//! client.abort_by_id("69490f5fc05fb78da7b7380f").await?;
//! # Ok(())
//! # }
//! ```

pub mod ambient;
pub mod memory;
pub mod traits;
pub mod types;

pub use ambient::{AmbientConfig, AmbientOverride};
pub use memory::{ClientCall, ConstructionObservation, InMemoryClientFactory, InMemoryTaskAutomation};
pub use traits::{ClientFactory, TaskAutomationClient};
pub use types::{task_id_filter, ClientSettings, LaunchRequest, TaskDefinition, TaskQueryResponse};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Client construction failed for region {region}: {message}")]
    Construction { region: String, message: String },

    #[error("Remote call {operation} failed: {message}")]
    Remote { operation: String, message: String },

    #[error("Remote call {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Invalid response from {operation}: {message}")]
    InvalidResponse { operation: String, message: String },
}

impl ClientError {
    pub fn construction(region: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction {
            region: region.into(),
            message: message.into(),
        }
    }

    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn invalid_response(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
