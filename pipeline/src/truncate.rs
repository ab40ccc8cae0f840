//! Truncating writer: clears the target before each write session.

use async_trait::async_trait;
use store::{Record, Result, StoreDeleter, StoreWriter};

/// A writer adapter that empties its target at the start of every write
/// session.
///
/// `begin_writing` opens the target's write session and deletes all existing
/// records once; writes then proceed normally. After the session ends, the
/// target holds exactly the records written during that session, regardless
/// of what it held before.
pub struct TruncatingWriter<S> {
    target: S,
    writing: bool,
}

impl<S> TruncatingWriter<S>
where
    S: StoreWriter + StoreDeleter + Send,
{
    /// Wraps a target that supports writing and bulk deletion.
    pub fn new(target: S) -> Self {
        Self {
            target,
            writing: false,
        }
    }

    /// Returns the wrapped target, consuming the adapter.
    pub fn into_inner(self) -> S {
        self.target
    }
}

#[async_trait]
impl<S> StoreWriter for TruncatingWriter<S>
where
    S: StoreWriter + StoreDeleter + Send,
{
    #[tracing::instrument(level = "trace", skip_all)]
    async fn begin_writing(&mut self) -> Result<()> {
        if self.writing {
            panic!("only one write session may be open on a store at a time");
        }
        self.target.begin_writing().await?;
        self.target.delete_all_records().await?;
        self.writing = true;
        Ok(())
    }

    async fn write_record(&mut self, record: Record) -> Result<()> {
        self.target.write_record(record).await
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn end_writing(&mut self) -> Result<()> {
        if !self.writing {
            panic!("end_writing called without a matching begin_writing");
        }
        self.target.end_writing().await?;
        self.writing = false;
        Ok(())
    }
}
