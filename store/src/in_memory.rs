//! In-memory store backend.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::record::Record;
use crate::stats::StoreStats;
use crate::traits::{StoreDeleter, StoreReader, StoreSeeker, StoreWriter};

/// Contents and session flags shared by every clone of a store handle.
struct Shared {
    records: Vec<Record>,
    reading: bool,
    writing: bool,
}

/// A store that keeps its records in a memory buffer.
///
/// Suitable for tests and small data sets; use [`SlateStore`](crate::SlateStore)
/// for anything larger. Records live in insertion order until a read session
/// begins, which sorts the buffer by key. Writes scan for an existing key and
/// replace it in place, so the buffer never holds two records with one key.
///
/// Cloning a handle shares the underlying buffer (the clones see the same
/// data), while the session flags are shared too: at most one read session
/// and one write session exist across all clones, and the two modes are
/// mutually exclusive on this backend.
#[derive(Clone)]
pub struct InMemoryStore {
    shared: Arc<RwLock<Shared>>,
    cursor: usize,
    read_open: bool,
    write_open: bool,
    stats: Option<Arc<StoreStats>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(RwLock::new(Shared {
                records: Vec::new(),
                reading: false,
                writing: false,
            })),
            cursor: 0,
            read_open: false,
            write_open: false,
            stats: None,
        }
    }

    /// Attaches a stats handle that read, write, and seek operations tick.
    pub fn with_stats(mut self, stats: Arc<StoreStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    fn lock_read(&self) -> Result<RwLockReadGuard<'_, Shared>> {
        self.shared
            .read()
            .map_err(|e| Error::Internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn lock_write(&self) -> Result<RwLockWriteGuard<'_, Shared>> {
        self.shared
            .write()
            .map_err(|e| Error::Internal(format!("Failed to acquire write lock: {}", e)))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreReader for InMemoryStore {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn begin_reading(&mut self) -> Result<()> {
        let mut shared = self.lock_write()?;
        if shared.reading {
            panic!("only one read session may be open on a store at a time");
        }
        if shared.writing {
            panic!("an in-memory store cannot be read while a write session is open");
        }
        shared.records.sort_by(|a, b| a.key.cmp(&b.key));
        shared.reading = true;
        drop(shared);
        self.read_open = true;
        self.cursor = 0;
        Ok(())
    }

    async fn read_record(&mut self) -> Result<Option<Record>> {
        if !self.read_open {
            panic!("read_record called outside a read session");
        }
        let shared = self.lock_read()?;
        if self.cursor >= shared.records.len() {
            return Ok(None);
        }
        let record = shared.records[self.cursor].clone();
        drop(shared);
        self.cursor += 1;
        if let Some(stats) = &self.stats {
            stats.record_read(&record);
        }
        Ok(Some(record))
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn end_reading(&mut self) -> Result<()> {
        if !self.read_open {
            panic!("end_reading called without a matching begin_reading");
        }
        let mut shared = self.lock_write()?;
        shared.reading = false;
        drop(shared);
        self.read_open = false;
        Ok(())
    }
}

#[async_trait]
impl StoreWriter for InMemoryStore {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn begin_writing(&mut self) -> Result<()> {
        let mut shared = self.lock_write()?;
        if shared.writing {
            panic!("only one write session may be open on a store at a time");
        }
        if shared.reading {
            panic!("an in-memory store cannot be written while a read session is open");
        }
        shared.writing = true;
        drop(shared);
        self.write_open = true;
        Ok(())
    }

    async fn write_record(&mut self, record: Record) -> Result<()> {
        if !self.write_open {
            panic!("write_record called outside a write session");
        }
        if let Some(stats) = &self.stats {
            stats.record_written(&record);
        }
        let mut shared = self.lock_write()?;
        for existing in shared.records.iter_mut() {
            if existing.key == record.key {
                *existing = record;
                return Ok(());
            }
        }
        shared.records.push(record);
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn end_writing(&mut self) -> Result<()> {
        if !self.write_open {
            panic!("end_writing called without a matching begin_writing");
        }
        let mut shared = self.lock_write()?;
        shared.writing = false;
        drop(shared);
        self.write_open = false;
        Ok(())
    }
}

#[async_trait]
impl StoreSeeker for InMemoryStore {
    async fn seek(&mut self, key: &[u8]) -> Result<()> {
        if !self.read_open {
            panic!("seek is only valid inside a read session");
        }
        // The buffer is sorted while a read session is open.
        let position = {
            let shared = self.lock_read()?;
            shared.records.partition_point(|r| r.key.as_ref() < key)
        };
        self.cursor = position;
        if let Some(stats) = &self.stats {
            stats.seek();
        }
        Ok(())
    }
}

#[async_trait]
impl StoreDeleter for InMemoryStore {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn delete_all_records(&mut self) -> Result<()> {
        if !self.read_open && !self.write_open {
            panic!("delete_all_records requires an open read or write session");
        }
        let mut shared = self.lock_write()?;
        shared.records.clear();
        drop(shared);
        self.cursor = 0;
        Ok(())
    }
}
