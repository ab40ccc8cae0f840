//! Factories binding store names to backend instances.
//!
//! A manager hands out one store handle per request, with one typed method
//! per capability the caller intends to use. The methods differ only in the
//! capability their name advertises (each returns the backend's concrete
//! store type, which implements the full capability set), so the call site
//! documents whether a store is opened to read, write, seek, or clear.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use slatedb::object_store::{self, ObjectStore};

use crate::config::{StoreConfig, create_object_store};
use crate::error::Result;
use crate::in_memory::InMemoryStore;
use crate::slate::SlateStore;
use crate::stats::StoreStats;

macro_rules! capability_methods {
    ($store:ty) => {
        /// Opens the named store for reading.
        pub fn reader(&self, name: &str) -> $store {
            self.open(name)
        }

        /// Opens the named store for writing.
        pub fn writer(&self, name: &str) -> $store {
            self.open(name)
        }

        /// Opens the named store for reading with seek support.
        pub fn seeker(&self, name: &str) -> $store {
            self.open(name)
        }

        /// Opens the named store for bulk deletion.
        pub fn deleter(&self, name: &str) -> $store {
            self.open(name)
        }

        /// Opens the named store for reading and writing.
        pub fn reading_writer(&self, name: &str) -> $store {
            self.open(name)
        }

        /// Opens the named store for seeking reads and writing.
        pub fn seeking_writer(&self, name: &str) -> $store {
            self.open(name)
        }

        /// Opens the named store for reading and bulk deletion.
        pub fn reading_deleter(&self, name: &str) -> $store {
            self.open(name)
        }

        /// Opens the named store for seeking reads and bulk deletion.
        pub fn seeking_deleter(&self, name: &str) -> $store {
            self.open(name)
        }
    };
}

/// Manages a family of SlateDB databases under one object-store root.
///
/// Each name maps to the database at `<root>/<name>`. Stores are created
/// lazily; the databases themselves are only opened when a session begins.
pub struct SlateManager {
    root: String,
    object_store: Arc<dyn ObjectStore>,
    stats: Option<Arc<StoreStats>>,
}

impl SlateManager {
    /// Creates a manager rooted at `root` inside `object_store`.
    pub fn new(root: impl Into<String>, object_store: Arc<dyn ObjectStore>) -> Self {
        Self {
            root: root.into(),
            object_store,
            stats: None,
        }
    }

    /// Creates a manager from configuration.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let object_store = create_object_store(&config.object_store)?;
        Ok(Self::new(config.root.clone(), object_store))
    }

    /// Creates a manager over a fresh in-memory object store.
    pub fn in_memory() -> Self {
        Self::new("db", Arc::new(object_store::memory::InMemory::new()))
    }

    /// Attaches a stats handle every store this manager opens will tick.
    pub fn with_stats(mut self, stats: Arc<StoreStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    fn open(&self, name: &str) -> SlateStore {
        let path = if self.root.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.root, name)
        };
        let mut store = SlateStore::new(path, self.object_store.clone());
        if let Some(stats) = &self.stats {
            store = store.with_stats(stats.clone());
        }
        store
    }

    capability_methods!(SlateStore);
}

/// Manages named in-memory stores.
///
/// Handles returned for the same name share their contents, so a pipeline
/// can write through one handle and read through another, the same shape
/// the disk-backed manager gives without the disk.
pub struct MemoryManager {
    stores: Mutex<HashMap<String, InMemoryStore>>,
    stats: Option<Arc<StoreStats>>,
}

impl MemoryManager {
    /// Creates a manager with no stores yet.
    pub fn new() -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
            stats: None,
        }
    }

    /// Attaches a stats handle every store this manager opens will tick.
    pub fn with_stats(mut self, stats: Arc<StoreStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    fn open(&self, name: &str) -> InMemoryStore {
        let mut stores = self.stores.lock().expect("memory manager lock poisoned");
        stores
            .entry(name.to_string())
            .or_insert_with(|| {
                let store = InMemoryStore::new();
                match &self.stats {
                    Some(stats) => store.with_stats(stats.clone()),
                    None => store,
                }
            })
            .clone()
    }

    capability_methods!(InMemoryStore);
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new()
    }
}
