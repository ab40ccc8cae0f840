//! Configuration for store backends.

use std::sync::Arc;

use slatedb::object_store::{self, ObjectStore};

use crate::error::{Error, Result};

/// Configuration for the object store backing a family of SlateDB databases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ObjectStoreConfig {
    /// Keep everything in memory. Useful for tests.
    #[default]
    InMemory,
    /// A directory on the local filesystem.
    Local(LocalObjectStoreConfig),
}

/// Settings for a local filesystem object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalObjectStoreConfig {
    /// Directory holding the databases. Created if missing.
    pub path: String,
}

/// Configuration for a [`SlateManager`](crate::SlateManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path prefix under which each named database lives.
    pub root: String,
    /// Object store backend configuration.
    pub object_store: ObjectStoreConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: "db".to_string(),
            object_store: ObjectStoreConfig::default(),
        }
    }
}

/// Creates an object store from configuration.
pub fn create_object_store(config: &ObjectStoreConfig) -> Result<Arc<dyn ObjectStore>> {
    match config {
        ObjectStoreConfig::InMemory => Ok(Arc::new(object_store::memory::InMemory::new())),
        ObjectStoreConfig::Local(local_config) => {
            std::fs::create_dir_all(&local_config.path).map_err(|e| {
                Error::Engine(format!(
                    "Failed to create storage directory '{}': {}",
                    local_config.path, e
                ))
            })?;
            let store = object_store::local::LocalFileSystem::new_with_prefix(&local_config.path)
                .map_err(|e| {
                    Error::Engine(format!("Failed to create local filesystem store: {}", e))
                })?;
            Ok(Arc::new(store))
        }
    }
}
