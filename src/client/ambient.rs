//! # Ambient Configuration Surface
//!
//! Some task-automation constructors read their region and owning workspace
//! from process-wide environment-style state rather than from parameters. That
//! state is shared by every caller in the process, so it is only ever written
//! through an [`AmbientOverride`] taken while holding the construction lock:
//!
//! ```rust
//! use batch_monitor::client::AmbientConfig;
//!
//! # async fn example() {
//! let ambient = AmbientConfig::new();
//! ambient.set("AWS_REGION", "eu-west-1");
//!
//! let _lock = ambient.lock_construction().await;
//! {
//!     let _override = ambient.override_with(&[("AWS_REGION", "us-east-1")]);
//!     assert_eq!(ambient.get("AWS_REGION").as_deref(), Some("us-east-1"));
//! }
//! assert_eq!(ambient.get("AWS_REGION").as_deref(), Some("eu-west-1"));
//! # }
//! ```
//!
//! The guard restores the snapshot when dropped, which covers early returns,
//! errors, panics and a cancelled constructing future alike.

use crate::constants::ambient_keys;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::{Mutex, MutexGuard};

static GLOBAL_AMBIENT: OnceLock<Arc<AmbientConfig>> = OnceLock::new();

#[derive(Debug, Default)]
pub struct AmbientConfig {
    values: RwLock<HashMap<String, String>>,
    construction_lock: Mutex<()>,
    /// Mirror writes into the real process environment
    mirror_process_env: bool,
}

impl AmbientConfig {
    /// Isolated surface, not connected to the process environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface seeded from the process environment that mirrors every write back into it
    ///
    /// Writes go through `std::env::set_var`/`remove_var` from whichever thread
    /// holds the construction lock. Rust's own env accessors are synchronized,
    /// but native code calling `getenv` is not, so mirroring is only sound when
    /// no native library in the process reads the environment concurrently.
    pub fn from_process_env() -> Self {
        let values = ambient_keys::CONSTRUCTION_KEYS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();

        Self {
            values: RwLock::new(values),
            construction_lock: Mutex::new(()),
            mirror_process_env: true,
        }
    }

    /// The process-wide surface, created from the environment on first use
    pub fn global() -> Arc<AmbientConfig> {
        GLOBAL_AMBIENT
            .get_or_init(|| Arc::new(Self::from_process_env()))
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
        if self.mirror_process_env {
            std::env::set_var(key, value);
        }
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let previous = self.values.write().remove(key);
        if self.mirror_process_env {
            std::env::remove_var(key);
        }
        previous
    }

    /// Serializes client construction across every registry sharing this surface
    pub async fn lock_construction(&self) -> MutexGuard<'_, ()> {
        self.construction_lock.lock().await
    }

    /// Snapshot the given keys and overwrite them until the guard drops
    pub fn override_with(&self, overrides: &[(&str, &str)]) -> AmbientOverride<'_> {
        let snapshot = overrides
            .iter()
            .map(|(key, _)| (key.to_string(), self.get(key)))
            .collect();

        for (key, value) in overrides {
            self.set(key, value);
        }

        AmbientOverride {
            ambient: self,
            snapshot,
        }
    }
}

/// Restores the overridden ambient keys on drop
#[derive(Debug)]
#[must_use = "the override is undone as soon as the guard is dropped"]
pub struct AmbientOverride<'a> {
    ambient: &'a AmbientConfig,
    snapshot: Vec<(String, Option<String>)>,
}

impl Drop for AmbientOverride<'_> {
    fn drop(&mut self) {
        // Reverse order so a key listed twice ends at its original value.
        for (key, previous) in self.snapshot.drain(..).rev() {
            match previous {
                Some(value) => self.ambient.set(&key, &value),
                None => {
                    self.ambient.remove(&key);
                }
            }
        }
    }
}
