//! SlateDB store backend.
//!
//! [`SlateStore`] adapts a SlateDB database to the session-scoped capability
//! traits. The database is opened on demand: constructing a store does not
//! touch the engine, the first `begin_reading`/`begin_writing` opens it, and
//! ending the last open session closes it again. A read session owns one
//! engine iterator for its whole lifetime; `seek` swaps that iterator for a
//! fresh scan starting at the target key, which makes repositioning valid in
//! either direction.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use slatedb::object_store::ObjectStore;
use slatedb::{Db, DbBuilder, DbIterator};

use crate::error::{Error, Result};
use crate::record::Record;
use crate::stats::StoreStats;
use crate::traits::{StoreDeleter, StoreReader, StoreSeeker, StoreWriter};

/// A store backed by a SlateDB database inside an object store.
///
/// Supports every capability: reading, writing, seeking, and bulk deletion.
/// Records read from the store carry the `database_index` configured with
/// [`with_database_index`](SlateStore::with_database_index) (default 0), so
/// a demux over several of these stores can tell their records apart.
pub struct SlateStore {
    path: String,
    object_store: Arc<dyn ObjectStore>,
    database_index: u8,
    stats: Option<Arc<StoreStats>>,
    db: Option<Db>,
    read_iter: Option<DbIterator>,
    reading: bool,
    writing: bool,
}

impl SlateStore {
    /// Creates a store for the database at `path` inside `object_store`.
    ///
    /// The database is not opened until a session begins.
    pub fn new(path: impl Into<String>, object_store: Arc<dyn ObjectStore>) -> Self {
        Self {
            path: path.into(),
            object_store,
            database_index: 0,
            stats: None,
            db: None,
            read_iter: None,
            reading: false,
            writing: false,
        }
    }

    /// Sets the partition tag stamped on every record read from this store.
    pub fn with_database_index(mut self, database_index: u8) -> Self {
        self.database_index = database_index;
        self
    }

    /// Attaches a stats handle that read, write, and seek operations tick.
    pub fn with_stats(mut self, stats: Arc<StoreStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Path of the underlying database inside the object store.
    pub fn path(&self) -> &str {
        &self.path
    }

    async fn open_database(&mut self) -> Result<()> {
        if self.db.is_none() {
            let db = DbBuilder::new(self.path.clone(), self.object_store.clone())
                .build()
                .await
                .map_err(|e| {
                    Error::Engine(format!("Failed to open database '{}': {}", self.path, e))
                })?;
            self.db = Some(db);
        }
        Ok(())
    }

    /// Closes the database once no session holds it open anymore.
    async fn maybe_close_database(&mut self) -> Result<()> {
        if self.reading || self.writing {
            return Ok(());
        }
        if let Some(db) = self.db.take() {
            db.close().await.map_err(Error::from_engine)?;
        }
        Ok(())
    }

    fn db(&self) -> &Db {
        self.db.as_ref().expect("database is open while a session is active")
    }
}

#[async_trait]
impl StoreReader for SlateStore {
    #[tracing::instrument(level = "trace", skip_all, fields(path = %self.path))]
    async fn begin_reading(&mut self) -> Result<()> {
        if self.reading {
            panic!("only one read session may be open on a store at a time");
        }
        self.open_database().await?;
        let iter = self
            .db()
            .scan::<Vec<u8>, _>(..)
            .await
            .map_err(Error::from_engine)?;
        self.read_iter = Some(iter);
        self.reading = true;
        Ok(())
    }

    async fn read_record(&mut self) -> Result<Option<Record>> {
        let iter = self
            .read_iter
            .as_mut()
            .expect("read_record called outside a read session");
        match iter.next().await.map_err(Error::from_engine)? {
            Some(kv) => {
                let record = Record::with_index(kv.key, kv.value, self.database_index);
                if let Some(stats) = &self.stats {
                    stats.record_read(&record);
                }
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(path = %self.path))]
    async fn end_reading(&mut self) -> Result<()> {
        if !self.reading {
            panic!("end_reading called without a matching begin_reading");
        }
        self.read_iter = None;
        self.reading = false;
        self.maybe_close_database().await
    }
}

#[async_trait]
impl StoreWriter for SlateStore {
    #[tracing::instrument(level = "trace", skip_all, fields(path = %self.path))]
    async fn begin_writing(&mut self) -> Result<()> {
        if self.writing {
            panic!("only one write session may be open on a store at a time");
        }
        self.open_database().await?;
        self.writing = true;
        Ok(())
    }

    async fn write_record(&mut self, record: Record) -> Result<()> {
        if !self.writing {
            panic!("write_record called outside a write session");
        }
        if let Some(stats) = &self.stats {
            stats.record_written(&record);
        }
        self.db()
            .put(&record.key, &record.value)
            .await
            .map_err(|e| Error::Engine(format!("Error writing to database: {}", e)))
    }

    #[tracing::instrument(level = "trace", skip_all, fields(path = %self.path))]
    async fn end_writing(&mut self) -> Result<()> {
        if !self.writing {
            panic!("end_writing called without a matching begin_writing");
        }
        self.db().flush().await.map_err(Error::from_engine)?;
        self.writing = false;
        self.maybe_close_database().await
    }
}

#[async_trait]
impl StoreSeeker for SlateStore {
    #[tracing::instrument(level = "trace", skip_all, fields(path = %self.path))]
    async fn seek(&mut self, key: &[u8]) -> Result<()> {
        if !self.reading {
            panic!("seek is only valid inside a read session");
        }
        // A fresh scan from the target key repositions in either direction.
        let iter = self
            .db()
            .scan(Bytes::copy_from_slice(key)..)
            .await
            .map_err(Error::from_engine)?;
        self.read_iter = Some(iter);
        if let Some(stats) = &self.stats {
            stats.seek();
        }
        Ok(())
    }
}

#[async_trait]
impl StoreDeleter for SlateStore {
    #[tracing::instrument(level = "trace", skip_all, fields(path = %self.path))]
    async fn delete_all_records(&mut self) -> Result<()> {
        if !self.reading && !self.writing {
            panic!("delete_all_records requires an open read or write session");
        }
        let mut iter = self
            .db()
            .scan::<Vec<u8>, _>(..)
            .await
            .map_err(Error::from_engine)?;
        while let Some(kv) = iter.next().await.map_err(Error::from_engine)? {
            self.db()
                .delete(&kv.key)
                .await
                .map_err(|e| Error::Engine(format!("Error clearing keys from database: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use slatedb::object_store::memory::InMemory;

    use super::*;

    fn test_store(path: &str) -> SlateStore {
        SlateStore::new(path, Arc::new(InMemory::new()))
    }

    fn record(key: &str, value: &str) -> Record {
        Record::new(
            Bytes::copy_from_slice(key.as_bytes()),
            Bytes::copy_from_slice(value.as_bytes()),
        )
    }

    async fn write_all(store: &mut SlateStore, records: &[(&str, &str)]) {
        store.begin_writing().await.unwrap();
        for (key, value) in records {
            store.write_record(record(key, value)).await.unwrap();
        }
        store.end_writing().await.unwrap();
    }

    async fn read_all(store: &mut SlateStore) -> Vec<Record> {
        let mut records = Vec::new();
        store.begin_reading().await.unwrap();
        while let Some(record) = store.read_record().await.unwrap() {
            records.push(record);
        }
        store.end_reading().await.unwrap();
        records
    }

    #[tokio::test]
    async fn should_read_back_records_in_key_order() {
        // given
        let mut store = test_store("order");
        write_all(&mut store, &[("b", "2"), ("c", "3"), ("a", "1")]).await;

        // when
        let records = read_all(&mut store).await;

        // then
        let keys: Vec<&[u8]> = records.iter().map(|r| r.key.as_ref()).collect();
        assert_eq!(keys, vec![b"a".as_slice(), b"b", b"c"]);
        assert_eq!(records[0].value, Bytes::from("1"));
    }

    #[tokio::test]
    async fn should_overwrite_on_same_key() {
        // given
        let mut store = test_store("upsert");
        write_all(&mut store, &[("k", "old")]).await;

        // when
        write_all(&mut store, &[("k", "new")]).await;

        // then
        let records = read_all(&mut store).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, Bytes::from("new"));
    }

    #[tokio::test]
    async fn should_seek_to_smallest_key_at_or_after_target() {
        // given
        let mut store = test_store("seek");
        write_all(&mut store, &[("a", "x"), ("b", "y"), ("c", "z"), ("d", "y"), ("e", "x")]).await;

        // when
        store.begin_reading().await.unwrap();
        store.seek(b"c").await.unwrap();
        let mut keys = Vec::new();
        while let Some(record) = store.read_record().await.unwrap() {
            keys.push(record.key.clone());
        }
        store.end_reading().await.unwrap();

        // then
        assert_eq!(keys, vec![Bytes::from("c"), Bytes::from("d"), Bytes::from("e")]);
    }

    #[tokio::test]
    async fn should_seek_backwards_after_reading_past_target() {
        // given
        let mut store = test_store("seek-back");
        write_all(&mut store, &[("a", "x"), ("b", "y"), ("c", "z")]).await;

        // when - read to the end, then seek back to the start
        store.begin_reading().await.unwrap();
        while store.read_record().await.unwrap().is_some() {}
        store.seek(b"a").await.unwrap();
        let first = store.read_record().await.unwrap();
        store.end_reading().await.unwrap();

        // then
        assert_eq!(first.unwrap().key, Bytes::from("a"));
    }

    #[tokio::test]
    async fn should_delete_all_records_inside_write_session() {
        // given
        let mut store = test_store("clear");
        write_all(&mut store, &[("a", "1"), ("b", "2")]).await;

        // when
        store.begin_writing().await.unwrap();
        store.delete_all_records().await.unwrap();
        store.write_record(record("c", "3")).await.unwrap();
        store.end_writing().await.unwrap();

        // then
        let records = read_all(&mut store).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, Bytes::from("c"));
    }

    #[tokio::test]
    async fn should_stamp_database_index_on_read() {
        // given
        let mut store = test_store("tagged").with_database_index(3);
        write_all(&mut store, &[("a", "1")]).await;

        // when
        let records = read_all(&mut store).await;

        // then
        assert_eq!(records[0].database_index, 3);
    }

    #[tokio::test]
    async fn should_keep_database_open_across_overlapping_sessions() {
        // given - a write session that stays open while a read session cycles
        let mut store = test_store("overlap");
        write_all(&mut store, &[("a", "1")]).await;

        store.begin_writing().await.unwrap();
        store.begin_reading().await.unwrap();

        // when - the read session ends while writing continues
        store.end_reading().await.unwrap();
        store.write_record(record("b", "2")).await.unwrap();
        store.end_writing().await.unwrap();

        // then
        let records = read_all(&mut store).await;
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    #[should_panic(expected = "only one read session may be open")]
    async fn should_panic_on_double_begin_reading() {
        let mut store = test_store("double-read");
        store.begin_reading().await.unwrap();
        store.begin_reading().await.unwrap();
    }

    #[tokio::test]
    #[should_panic(expected = "only one write session may be open")]
    async fn should_panic_on_double_begin_writing() {
        let mut store = test_store("double-write");
        store.begin_writing().await.unwrap();
        store.begin_writing().await.unwrap();
    }

    #[tokio::test]
    #[should_panic(expected = "seek is only valid inside a read session")]
    async fn should_panic_on_seek_outside_read_session() {
        let mut store = test_store("seek-no-session");
        store.seek(b"a").await.unwrap();
    }

    #[tokio::test]
    #[should_panic(expected = "requires an open read or write session")]
    async fn should_panic_on_delete_outside_any_session() {
        let mut store = test_store("delete-no-session");
        store.delete_all_records().await.unwrap();
    }
}
