//! Test doubles for exercising pipeline stages.

use async_trait::async_trait;
use store::{Record, Result, StoreReader};

/// A reader that yields a fixed list of records in the order given.
///
/// Unlike a real store it performs no sorting, which lets tests control the
/// exact delivery order, including orders a sorted backend cannot produce.
pub(crate) struct FixedReader {
    records: Vec<Record>,
    cursor: usize,
    open: bool,
}

impl FixedReader {
    pub(crate) fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            cursor: 0,
            open: false,
        }
    }
}

#[async_trait]
impl StoreReader for FixedReader {
    async fn begin_reading(&mut self) -> Result<()> {
        assert!(!self.open, "read session already open");
        self.open = true;
        self.cursor = 0;
        Ok(())
    }

    async fn read_record(&mut self) -> Result<Option<Record>> {
        assert!(self.open, "read_record outside a read session");
        if self.cursor >= self.records.len() {
            return Ok(None);
        }
        let record = self.records[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(record))
    }

    async fn end_reading(&mut self) -> Result<()> {
        assert!(self.open, "end_reading without begin_reading");
        self.open = false;
        Ok(())
    }
}

/// A reader that serves a few records and then fails every read.
pub(crate) struct FailingReader {
    records: Vec<Record>,
    fail_after: usize,
    served: usize,
}

impl FailingReader {
    pub(crate) fn new(records: Vec<Record>, fail_after: usize) -> Self {
        Self {
            records,
            fail_after,
            served: 0,
        }
    }
}

#[async_trait]
impl StoreReader for FailingReader {
    async fn begin_reading(&mut self) -> Result<()> {
        self.served = 0;
        Ok(())
    }

    async fn read_record(&mut self) -> Result<Option<Record>> {
        if self.served >= self.fail_after {
            return Err(store::Error::Engine("injected read failure".to_string()));
        }
        let record = self.records.get(self.served).cloned();
        self.served += 1;
        Ok(record)
    }

    async fn end_reading(&mut self) -> Result<()> {
        Ok(())
    }
}
