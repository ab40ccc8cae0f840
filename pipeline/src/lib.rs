//! Composable sorted record pipelines.
//!
//! This crate builds streaming pipelines out of the store capabilities
//! defined in the `store` crate. Every stage consumes the `StoreReader` or
//! `StoreWriter` contract of the stage upstream and exposes the same
//! contract downstream, so stages stack in any combination. Control flow is
//! pull-based: the terminal consumer drives reads, each stage performing at
//! most one upstream pull per downstream pull.
//!
//! # Stages
//!
//! - **[`DemuxReader`]**: merges any number of ascending readers into one
//!   ascending reader, breaking key ties by input index.
//! - **[`MuxWriter`]**: routes records to one of several sink writers by
//!   their partition tag.
//! - **[`RangeExcludingReader`]**: filters a reader against closed key
//!   intervals supplied by a second reader.
//! - **[`TruncatingWriter`]**: clears its target at the start of each write
//!   session.
//! - **[`Grouper`]**: turns a sorted reader into a two-level iterator over
//!   groups that share a decoded key prefix.
//!
//! # Example
//!
//! ```ignore
//! use pipeline::{DemuxReader, RangeExcludingReader};
//! use store::StoreReader;
//!
//! // Merge three partitions, then drop records inside excluded ranges.
//! let merged = DemuxReader::new(vec![
//!     Box::new(manager.reader("part-0")),
//!     Box::new(manager.reader("part-1")),
//!     Box::new(manager.reader("part-2")),
//! ]);
//! let mut reader = RangeExcludingReader::new(
//!     Box::new(merged),
//!     Box::new(manager.reader("tombstones")),
//! );
//!
//! reader.begin_reading().await?;
//! while let Some(record) = reader.read_record().await? {
//!     // ...
//! }
//! reader.end_reading().await?;
//! ```

mod demux;
mod error;
mod exclude;
mod group;
mod mux;
mod truncate;

#[cfg(test)]
pub(crate) mod testing;

pub use demux::DemuxReader;
pub use error::{Error, Result};
pub use exclude::RangeExcludingReader;
pub use group::Grouper;
pub use mux::MuxWriter;
pub use truncate::TruncatingWriter;
