//! # Region Client Registry
//!
//! Per-context cache of task-automation clients keyed by region.
//!
//! Each region slot moves through absent, constructing and ready. Lookups of a
//! ready slot never wait on anything. Construction is serialized by the
//! process-wide lock owned by [`AmbientConfig`], because a constructor may read
//! the shared region and workspace keys instead of its parameters:
//!
//! 1. take the construction lock and re-check the slot,
//! 2. override the ambient region and workspace keys for the requested region,
//! 3. run the factory,
//! 4. restore the ambient keys (the guard restores on every exit path),
//! 5. cache the client, then release the lock.
//!
//! A failed construction leaves the slot absent; other regions are unaffected
//! and the next request for the same region tries again.

use crate::client::{
    AmbientConfig, ClientError, ClientFactory, ClientSettings, TaskAutomationClient,
};
use crate::constants::ambient_keys;
use crate::logging::{log_error, log_registry_operation};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Client registry unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Invalid region: {region:?}")]
    InvalidRegion { region: String },

    #[error("Failed to construct client for region {region}: {source}")]
    Construction {
        region: String,
        #[source]
        source: ClientError,
    },

    #[error("Client constructed for region {requested} is bound to region {bound}")]
    RegionMismatch { requested: String, bound: String },
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable { reason: String },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub cached_regions: usize,
    /// Clients built and cached by this registry
    pub constructions: usize,
    /// Factory errors and rejected clients
    pub construction_failures: usize,
}

pub struct RegionClientRegistry {
    workspace_uid: Option<String>,
    factory: Arc<dyn ClientFactory>,
    ambient: Arc<AmbientConfig>,
    clients: DashMap<String, Arc<dyn TaskAutomationClient>>,
    constructions: AtomicUsize,
    construction_failures: AtomicUsize,
}

impl std::fmt::Debug for RegionClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionClientRegistry")
            .field("workspace_uid", &self.workspace_uid)
            .field("cached_regions", &self.cached_regions())
            .finish()
    }
}

impl RegionClientRegistry {
    pub fn new(
        workspace_uid: Option<String>,
        factory: Arc<dyn ClientFactory>,
        ambient: Arc<AmbientConfig>,
    ) -> Self {
        let workspace_uid = workspace_uid.filter(|uid| !uid.trim().is_empty());

        Self {
            workspace_uid,
            factory,
            ambient,
            clients: DashMap::new(),
            constructions: AtomicUsize::new(0),
            construction_failures: AtomicUsize::new(0),
        }
    }

    pub fn workspace_uid(&self) -> Option<&str> {
        self.workspace_uid.as_deref()
    }

    /// Whether actions can be offered at all, which requires a workspace uid
    ///
    /// Construction failures are per region and are not reflected here: a
    /// region whose client keeps failing to build still reports `Available`,
    /// and each failing request surfaces `RegistryError::Construction`
    /// instead. See [`RegistryStats::construction_failures`].
    pub fn availability(&self) -> Availability {
        match &self.workspace_uid {
            Some(_) => Availability::Available,
            None => Availability::Unavailable {
                reason: "workspace uid is not configured".to_string(),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability().is_available()
    }

    /// Client for `region`, constructed on first use
    pub async fn get_client(&self, region: &str) -> RegistryResult<Arc<dyn TaskAutomationClient>> {
        let region = region.trim();
        if region.is_empty() {
            return Err(RegistryError::InvalidRegion {
                region: region.to_string(),
            });
        }

        let Some(workspace_uid) = self.workspace_uid.clone() else {
            return Err(RegistryError::Unavailable {
                reason: self
                    .availability()
                    .reason()
                    .unwrap_or("workspace uid is not configured")
                    .to_string(),
            });
        };

        if let Some(client) = self.cached(region) {
            return Ok(client);
        }

        let _construction = self.ambient.lock_construction().await;

        // Another worker may have finished while we waited for the lock.
        if let Some(client) = self.cached(region) {
            debug!(region = %region, "Client constructed while waiting for construction lock");
            return Ok(client);
        }

        let settings = ClientSettings::new(region, workspace_uid.as_str());
        let created = {
            let _ambient = self.ambient.override_with(&[
                (ambient_keys::REGION, region),
                (ambient_keys::DEFAULT_REGION, region),
                (ambient_keys::WORKSPACE_UID, workspace_uid.as_str()),
            ]);
            self.factory.create_client(&settings).await
        };

        let client = match created {
            Ok(client) => client,
            Err(source) => {
                self.construction_failures.fetch_add(1, Ordering::AcqRel);
                log_error(
                    "region_client_registry",
                    "get_client",
                    &source.to_string(),
                    Some(region),
                );
                return Err(RegistryError::Construction {
                    region: region.to_string(),
                    source,
                });
            }
        };

        if client.region() != region {
            self.construction_failures.fetch_add(1, Ordering::AcqRel);
            let error = RegistryError::RegionMismatch {
                requested: region.to_string(),
                bound: client.region().to_string(),
            };
            log_error(
                "region_client_registry",
                "get_client",
                &error.to_string(),
                Some(region),
            );
            return Err(error);
        }

        self.clients.insert(region.to_string(), client.clone());
        self.constructions.fetch_add(1, Ordering::AcqRel);

        log_registry_operation(
            "get_client",
            region,
            "constructed",
            Some(self.clients.len()),
            None,
        );

        Ok(client)
    }

    fn cached(&self, region: &str) -> Option<Arc<dyn TaskAutomationClient>> {
        self.clients.get(region).map(|entry| entry.value().clone())
    }

    /// Regions with a ready client, sorted
    pub fn cached_regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self.clients.iter().map(|entry| entry.key().clone()).collect();
        regions.sort();
        regions
    }

    /// Drop the cached client for `region`; the next request rebuilds it
    pub fn evict(&self, region: &str) -> bool {
        let evicted = self.clients.remove(region).is_some();
        if evicted {
            log_registry_operation("evict", region, "evicted", Some(self.clients.len()), None);
        }
        evicted
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            cached_regions: self.clients.len(),
            constructions: self.constructions.load(Ordering::Acquire),
            construction_failures: self.construction_failures.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClientFactory;
    use std::time::Duration;

    fn registry_with(factory: Arc<InMemoryClientFactory>) -> RegionClientRegistry {
        RegionClientRegistry::new(
            Some("pre".to_string()),
            factory,
            Arc::new(AmbientConfig::new()),
        )
    }

    #[tokio::test]
    async fn test_client_is_cached_per_region() {
        let factory = Arc::new(InMemoryClientFactory::new());
        let registry = registry_with(factory.clone());

        let first = registry.get_client("eu-west-1").await.unwrap();
        let second = registry.get_client("eu-west-1").await.unwrap();
        let other = registry.get_client("us-east-1").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(factory.constructions(), 2);
        assert_eq!(registry.cached_regions(), vec!["eu-west-1", "us-east-1"]);
        assert_eq!(
            registry.stats(),
            RegistryStats {
                cached_regions: 2,
                constructions: 2,
                construction_failures: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_workspace_makes_registry_unavailable() {
        let factory = Arc::new(InMemoryClientFactory::new());
        let registry =
            RegionClientRegistry::new(Some("  ".to_string()), factory.clone(), Arc::new(AmbientConfig::new()));

        assert!(!registry.is_available());
        assert!(matches!(
            registry.get_client("eu-west-1").await,
            Err(RegistryError::Unavailable { .. })
        ));
        assert_eq!(factory.constructions(), 0);
    }

    #[tokio::test]
    async fn test_empty_region_is_rejected() {
        let registry = registry_with(Arc::new(InMemoryClientFactory::new()));
        assert!(matches!(
            registry.get_client(" ").await,
            Err(RegistryError::InvalidRegion { .. })
        ));
    }

    #[tokio::test]
    async fn test_construction_failure_leaves_other_regions_usable() {
        let factory = Arc::new(InMemoryClientFactory::new());
        factory.fail_construction_for("us-east-1", "no credentials for region");
        let registry = registry_with(factory.clone());

        let err = registry.get_client("us-east-1").await.err().unwrap();
        assert!(matches!(err, RegistryError::Construction { ref region, .. } if region == "us-east-1"));
        assert_eq!(registry.availability(), Availability::Available);
        assert!(registry.get_client("eu-west-1").await.is_ok());

        factory.clear_construction_failure("us-east-1");
        assert!(registry.get_client("us-east-1").await.is_ok());
        assert_eq!(registry.stats().construction_failures, 1);
        assert_eq!(registry.stats().constructions, 2);
    }

    #[tokio::test]
    async fn test_region_mismatch_is_not_cached() {
        let factory = Arc::new(InMemoryClientFactory::new());
        factory.bind_every_client_to(Some("ap-south-1"));
        let registry = registry_with(factory.clone());

        assert_eq!(
            registry.get_client("eu-west-1").await.err().unwrap(),
            RegistryError::RegionMismatch {
                requested: "eu-west-1".to_string(),
                bound: "ap-south-1".to_string(),
            }
        );
        assert!(registry.cached_regions().is_empty());

        factory.bind_every_client_to(None);
        assert!(registry.get_client("eu-west-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_ambient_values_restored_after_construction() {
        let ambient = Arc::new(AmbientConfig::new());
        ambient.set(ambient_keys::REGION, "eu-central-1");
        let factory = Arc::new(InMemoryClientFactory::new().reading_ambient(ambient.clone()));
        factory.fail_construction_for("ap-south-1", "boom");
        let registry = RegionClientRegistry::new(Some("pre".to_string()), factory.clone(), ambient.clone());

        let client = registry.get_client("us-east-1").await.unwrap();
        assert_eq!(client.region(), "us-east-1");
        assert!(registry.get_client("ap-south-1").await.is_err());

        assert_eq!(ambient.get(ambient_keys::REGION).as_deref(), Some("eu-central-1"));
        assert_eq!(ambient.get(ambient_keys::DEFAULT_REGION), None);
        assert_eq!(ambient.get(ambient_keys::WORKSPACE_UID), None);
        assert!(factory
            .observations()
            .iter()
            .all(|observation| observation.ambient_matches_request()));
    }

    #[tokio::test]
    async fn test_evict_forces_rebuild() {
        let factory = Arc::new(InMemoryClientFactory::new());
        let registry = registry_with(factory.clone());

        let first = registry.get_client("eu-west-1").await.unwrap();
        assert!(registry.evict("eu-west-1"));
        assert!(!registry.evict("eu-west-1"));

        let rebuilt = registry.get_client("eu-west-1").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(factory.constructions(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_construct_once() {
        let factory = Arc::new(
            InMemoryClientFactory::new().with_construction_delay(Duration::from_millis(25)),
        );
        let registry = Arc::new(registry_with(factory.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.get_client("eu-west-1").await })
            })
            .collect();

        let clients: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert!(clients.iter().all(|client| Arc::ptr_eq(client, &clients[0])));
        assert_eq!(factory.constructions(), 1);
        assert_eq!(registry.stats().constructions, 1);
    }
}
