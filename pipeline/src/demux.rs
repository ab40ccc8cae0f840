//! Demultiplexing reader: a k-way ascending merge of sorted readers.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use async_trait::async_trait;
use store::{Error, Record, Result, StoreReader};

/// Merges any number of ascending readers into one ascending reader.
///
/// Each input must deliver records in ascending key order; the merged output
/// is then ascending overall. When the same key appears in several inputs,
/// all records with that key are produced, ordered by input index (lower
/// index first). Every record keeps the `database_index` its source gave it,
/// so a downstream consumer can still tell the inputs apart.
///
/// The merge holds one record per live input in a frontier heap. An input
/// that reaches end-of-stream drops out of the frontier; when the frontier
/// is empty, the merge reports end-of-stream. The first input error aborts
/// the merge: the error is returned and replayed on every later read until
/// the session ends.
pub struct DemuxReader {
    readers: Vec<Box<dyn StoreReader + Send>>,
    frontier: BinaryHeap<Reverse<FrontierEntry>>,
    opened: usize,
    reading: bool,
    failed: Option<Error>,
}

impl DemuxReader {
    /// Creates a merge over the given sub-readers.
    ///
    /// Input index, the position in `readers`, is the tie-break for
    /// records with equal keys.
    pub fn new(readers: Vec<Box<dyn StoreReader + Send>>) -> Self {
        let capacity = readers.len();
        Self {
            readers,
            frontier: BinaryHeap::with_capacity(capacity),
            opened: 0,
            reading: false,
            failed: None,
        }
    }

    /// Pulls the next record from one sub-reader into the frontier.
    async fn refill(&mut self, reader_index: usize) -> Result<()> {
        if let Some(record) = self.readers[reader_index].read_record().await? {
            self.frontier.push(Reverse(FrontierEntry {
                record,
                reader_index,
            }));
        }
        Ok(())
    }

    fn latch(&mut self, error: Error) -> Error {
        self.failed = Some(error.clone());
        error
    }
}

#[async_trait]
impl StoreReader for DemuxReader {
    #[tracing::instrument(level = "trace", skip_all, fields(inputs = self.readers.len()))]
    async fn begin_reading(&mut self) -> Result<()> {
        if self.reading {
            panic!("only one read session may be open on a store at a time");
        }
        self.reading = true;
        for index in 0..self.readers.len() {
            if let Err(e) = self.readers[index].begin_reading().await {
                return Err(self.latch(e));
            }
            self.opened = index + 1;
        }
        for index in 0..self.readers.len() {
            if let Err(e) = self.refill(index).await {
                return Err(self.latch(e));
            }
        }
        Ok(())
    }

    async fn read_record(&mut self) -> Result<Option<Record>> {
        if let Some(error) = &self.failed {
            return Err(error.clone());
        }
        if !self.reading {
            panic!("read_record called outside a read session");
        }
        let Some(Reverse(entry)) = self.frontier.pop() else {
            return Ok(None);
        };
        if let Err(e) = self.refill(entry.reader_index).await {
            return Err(self.latch(e));
        }
        Ok(Some(entry.record))
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn end_reading(&mut self) -> Result<()> {
        if !self.reading {
            panic!("end_reading called without a matching begin_reading");
        }
        let mut first_error = None;
        for reader in self.readers.iter_mut().take(self.opened) {
            if let Err(e) = reader.end_reading().await {
                first_error.get_or_insert(e);
            }
        }
        self.frontier.clear();
        self.opened = 0;
        self.reading = false;
        self.failed = None;
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct FrontierEntry {
    record: Record,
    reader_index: usize,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Equal keys resolve by input index, so duplicate keys come out in
        // input order and the merge stays stable.
        self.record
            .key
            .cmp(&other.record.key)
            .then(self.reader_index.cmp(&other.reader_index))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}
