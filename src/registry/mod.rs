//! # Registry Infrastructure
//!
//! Registries owning long-lived remote clients.
//!
//! ## Available Registries
//!
//! - **RegionClientRegistry**: lazily constructed task-automation clients, one per region
//!
//! ## Architecture
//!
//! ```text
//! RegionClientRegistry (one per execution context)
//! ├── client cache          (region -> client, lock-free lookups)
//! └── AmbientConfig         (process-wide, shared by every registry)
//!     ├── construction lock (one construction at a time, process-wide)
//!     └── key/value surface (overridden only while a client is built)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use batch_monitor::client::{AmbientConfig, InMemoryClientFactory};
//! use batch_monitor::registry::RegionClientRegistry;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = RegionClientRegistry::new(
//!     Some("pre".to_string()),
//!     Arc::new(InMemoryClientFactory::new()),
//!     Arc::new(AmbientConfig::new()),
//! );
//!
//! let client = registry.get_client("eu-west-1").await?;
//! assert_eq!(client.region(), "eu-west-1");
//! # Ok(())
//! # }
//! ```

pub mod region_client_registry;

pub use region_client_registry::{
    Availability, RegionClientRegistry, RegistryError, RegistryResult, RegistryStats,
};
