//! Capability-indexed driver registry.
//!
//! One generic registry maps a driver identifier to whatever a capability
//! needs at construction time: a repository factory, a provider adapter.
//! Registration happens explicitly in the composition root so the set of
//! available backends is a readable call sequence rather than scattered
//! module-initialization side effects.

use std::{collections::HashMap, fmt, future::Future, hash::Hash, pin::Pin};

use parking_lot::RwLock;
use thiserror::Error;

use crate::errors::RepositoryError;

/// Future returned by a factory's cleanup.
pub type CleanupFuture = Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send>>;

/// Deferred teardown handed out by a factory next to the repository it
/// built: final flush for the file backend, pool close for the SQL backends.
/// Run exactly once at shutdown.
pub type Cleanup = Box<dyn FnOnce() -> CleanupFuture + Send>;

/// Errors from registry mutation.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("driver {0} is already registered")]
    Duplicate(String),
}

/// Concurrency-safe mapping from a driver identifier to a registered entry.
pub struct DriverRegistry<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> fmt::Debug for DriverRegistry<K, V>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_struct("DriverRegistry")
            .field("drivers", &entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K, V> Default for DriverRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> DriverRegistry<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> DriverRegistry<K, V>
where
    K: Copy + Eq + Hash + fmt::Display,
    V: Clone,
{
    /// Register `entry` under `driver`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the driver id is already
    /// taken: two backends claiming the same id would otherwise silently
    /// clobber one another.
    pub fn register(&self, driver: K, entry: V) -> Result<(), RegistryError> {
        let mut entries = self.entries.write();
        if entries.contains_key(&driver) {
            return Err(RegistryError::Duplicate(driver.to_string()));
        }
        entries.insert(driver, entry);
        Ok(())
    }

    /// Look up the entry registered under `driver`.
    ///
    /// Absence is an ordinary lookup miss for the caller to surface as a
    /// configuration error; it never panics.
    #[must_use]
    pub fn get(&self, driver: K) -> Option<V> {
        self.entries.read().get(&driver).cloned()
    }
}
