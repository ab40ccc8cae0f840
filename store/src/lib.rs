//! Ordered key-value stores with session-scoped reading and writing.
//!
//! This crate defines the record type and capability traits that sorted
//! record pipelines are built from, plus two backends: an in-memory store
//! for tests and small data, and a SlateDB-backed store for everything else.
//!
//! # Key Concepts
//!
//! - **Record**: an immutable `(key, value, database_index)` triple. Keys
//!   compare by unsigned lexicographic byte order.
//! - **Capabilities**: a backend implements some subset of [`StoreReader`],
//!   [`StoreWriter`], [`StoreSeeker`], and [`StoreDeleter`]; composite
//!   marker traits ([`ReadingWriter`], [`SeekingDeleter`], ...) name the
//!   unions a backend advertises.
//! - **Sessions**: reads and writes happen inside begin/end brackets. At
//!   most one session per mode is open at a time; violating that is a
//!   programming error and panics. I/O failures come back as [`Error`]
//!   values, and end-of-stream is `Ok(None)`.
//! - **Managers**: [`SlateManager`] and [`MemoryManager`] bind names to
//!   backend instances, one typed constructor per capability.
//!
//! # Example
//!
//! ```ignore
//! use bytes::Bytes;
//! use store::{Record, SlateManager, StoreReader, StoreWriter};
//!
//! let manager = SlateManager::from_config(&config)?;
//!
//! let mut writer = manager.writer("events");
//! writer.begin_writing().await?;
//! writer.write_record(Record::new(Bytes::from("k"), Bytes::from("v"))).await?;
//! writer.end_writing().await?;
//!
//! let mut reader = manager.reader("events");
//! reader.begin_reading().await?;
//! while let Some(record) = reader.read_record().await? {
//!     println!("{:?}: {:?}", record.key, record.value);
//! }
//! reader.end_reading().await?;
//! ```

mod config;
mod error;
mod in_memory;
mod manager;
mod record;
mod slate;
mod stats;
mod traits;

pub use config::{LocalObjectStoreConfig, ObjectStoreConfig, StoreConfig, create_object_store};
pub use error::{Error, Result};
pub use in_memory::InMemoryStore;
pub use manager::{MemoryManager, SlateManager};
pub use record::Record;
pub use slate::SlateStore;
#[cfg(feature = "metrics")]
pub use stats::StoreMetrics;
pub use stats::StoreStats;
pub use traits::{
    FullStore, ReadingDeleter, ReadingWriter, SeekingDeleter, SeekingWriter, StoreDeleter,
    StoreReader, StoreSeeker, StoreWriter, WritingDeleter,
};
