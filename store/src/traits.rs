//! Capability traits every store backend is polymorphic over.
//!
//! A backend implements some subset of [`StoreReader`], [`StoreWriter`],
//! [`StoreSeeker`], and [`StoreDeleter`]; the composite marker traits below
//! name the unions a backend can advertise. Pipeline stages consume and
//! expose the same capabilities, so stages compose: a demux reader is a
//! `StoreReader` over other `StoreReader`s.
//!
//! # Session Contract
//!
//! Reading and writing are session-scoped: every `read_record` happens
//! between `begin_reading` and `end_reading`, every `write_record` between
//! `begin_writing` and `end_writing`. Sessions of the same mode are
//! singleton: beginning one twice without ending it is a contract
//! violation and panics. I/O failures are returned as [`Error`] values;
//! end-of-stream is `Ok(None)`, never an error.

use async_trait::async_trait;

use crate::error::Result;
use crate::record::Record;

/// Session-scoped sequential access to a store in ascending key order.
#[async_trait]
pub trait StoreReader {
    /// Opens a read session, positioning the cursor before the first record.
    ///
    /// Panics if a read session is already open on this store.
    async fn begin_reading(&mut self) -> Result<()>;

    /// Returns the next record in ascending key order, or `None` at
    /// end-of-stream.
    ///
    /// Returned records remain valid after subsequent reads.
    async fn read_record(&mut self) -> Result<Option<Record>>;

    /// Closes the read session, releasing any engine resources it held.
    async fn end_reading(&mut self) -> Result<()>;
}

/// Session-scoped writes with upsert-by-key semantics.
#[async_trait]
pub trait StoreWriter {
    /// Opens a write session.
    ///
    /// Panics if a write session is already open on this store.
    async fn begin_writing(&mut self) -> Result<()>;

    /// Writes a record, replacing any existing record with the same key.
    async fn write_record(&mut self, record: Record) -> Result<()>;

    /// Closes the write session, releasing any engine resources it held.
    async fn end_writing(&mut self) -> Result<()>;
}

/// A reader whose cursor can be repositioned forward or backward.
#[async_trait]
pub trait StoreSeeker: StoreReader {
    /// Positions the cursor so the next `read_record` returns the smallest
    /// key that is `>= key`, or end-of-stream if no such key exists.
    ///
    /// Panics outside a read session.
    async fn seek(&mut self, key: &[u8]) -> Result<()>;
}

/// Bulk deletion of every record in a store.
#[async_trait]
pub trait StoreDeleter {
    /// Deletes all records.
    ///
    /// Panics unless a read or write session is open on this store.
    async fn delete_all_records(&mut self) -> Result<()>;
}

/// A backend that can both read and write.
pub trait ReadingWriter: StoreReader + StoreWriter {}
impl<T: StoreReader + StoreWriter + ?Sized> ReadingWriter for T {}

/// A backend that can seek while reading and also write.
pub trait SeekingWriter: StoreSeeker + StoreWriter {}
impl<T: StoreSeeker + StoreWriter + ?Sized> SeekingWriter for T {}

/// A backend that can read and clear itself.
pub trait ReadingDeleter: StoreReader + StoreDeleter {}
impl<T: StoreReader + StoreDeleter + ?Sized> ReadingDeleter for T {}

/// A backend that can seek while reading and clear itself.
pub trait SeekingDeleter: StoreSeeker + StoreDeleter {}
impl<T: StoreSeeker + StoreDeleter + ?Sized> SeekingDeleter for T {}

/// A backend that can write and clear itself, the shape a truncating
/// writer adapts.
pub trait WritingDeleter: StoreWriter + StoreDeleter {}
impl<T: StoreWriter + StoreDeleter + ?Sized> WritingDeleter for T {}

/// A backend supporting every capability.
pub trait FullStore: StoreSeeker + StoreWriter + StoreDeleter {}
impl<T: StoreSeeker + StoreWriter + StoreDeleter + ?Sized> FullStore for T {}
