//! Multiplexing writer: dispatches records to sinks by partition tag.

use async_trait::async_trait;
use store::{Record, Result, StoreWriter};

/// Routes each record to the sink named by its `database_index`.
///
/// Sink write sessions open lazily, on the first record routed to that
/// sink; sinks that never receive a record are never opened. Ending the
/// mux session ends every sink session that was opened. Records for one
/// sink arrive at that sink in the order they arrived at the mux.
///
/// A record whose tag is not a valid sink position is a programming error
/// and panics.
pub struct MuxWriter {
    writers: Vec<Box<dyn StoreWriter + Send>>,
    opened: Vec<bool>,
    writing: bool,
}

impl MuxWriter {
    /// Creates a mux over the given sinks; sink `i` receives records
    /// tagged `i`.
    pub fn new(writers: Vec<Box<dyn StoreWriter + Send>>) -> Self {
        let opened = vec![false; writers.len()];
        Self {
            writers,
            opened,
            writing: false,
        }
    }
}

#[async_trait]
impl StoreWriter for MuxWriter {
    #[tracing::instrument(level = "trace", skip_all, fields(sinks = self.writers.len()))]
    async fn begin_writing(&mut self) -> Result<()> {
        if self.writing {
            panic!("only one write session may be open on a store at a time");
        }
        self.writing = true;
        Ok(())
    }

    async fn write_record(&mut self, record: Record) -> Result<()> {
        if !self.writing {
            panic!("write_record called outside a write session");
        }
        let index = record.database_index as usize;
        if index >= self.writers.len() {
            panic!(
                "record tagged {} cannot be routed by a mux with {} sinks",
                record.database_index,
                self.writers.len()
            );
        }
        if !self.opened[index] {
            self.writers[index].begin_writing().await?;
            self.opened[index] = true;
        }
        self.writers[index].write_record(record).await
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn end_writing(&mut self) -> Result<()> {
        if !self.writing {
            panic!("end_writing called without a matching begin_writing");
        }
        let mut first_error = None;
        for (writer, opened) in self.writers.iter_mut().zip(self.opened.iter_mut()) {
            if *opened {
                if let Err(e) = writer.end_writing().await {
                    first_error.get_or_insert(e);
                }
                *opened = false;
            }
        }
        self.writing = false;
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use store::{InMemoryStore, StoreReader};

    use super::*;

    fn record(key: &str, value: &str, database_index: u8) -> Record {
        Record::with_index(
            Bytes::copy_from_slice(key.as_bytes()),
            Bytes::copy_from_slice(value.as_bytes()),
            database_index,
        )
    }

    async fn read_all(store: &mut InMemoryStore) -> Vec<Record> {
        let mut records = Vec::new();
        store.begin_reading().await.unwrap();
        while let Some(record) = store.read_record().await.unwrap() {
            records.push(record);
        }
        store.end_reading().await.unwrap();
        records
    }

    #[tokio::test]
    async fn should_dispatch_records_to_sinks_by_tag() {
        // given
        let first = InMemoryStore::new();
        let second = InMemoryStore::new();
        let records = vec![
            record("a", "b", 0),
            record("c", "d", 1),
            record("e", "f", 0),
            record("g", "h", 1),
        ];

        // when
        let mut writer = MuxWriter::new(vec![
            Box::new(first.clone()),
            Box::new(second.clone()),
        ]);
        writer.begin_writing().await.unwrap();
        for record in records {
            writer.write_record(record).await.unwrap();
        }
        writer.end_writing().await.unwrap();

        // then
        let mut first = first;
        let first_records = read_all(&mut first).await;
        let pairs: Vec<(&[u8], &[u8])> = first_records
            .iter()
            .map(|r| (r.key.as_ref(), r.value.as_ref()))
            .collect();
        assert_eq!(pairs, vec![(b"a".as_slice(), b"b".as_slice()), (b"e", b"f")]);

        let mut second = second;
        let second_records = read_all(&mut second).await;
        let pairs: Vec<(&[u8], &[u8])> = second_records
            .iter()
            .map(|r| (r.key.as_ref(), r.value.as_ref()))
            .collect();
        assert_eq!(pairs, vec![(b"c".as_slice(), b"d".as_slice()), (b"g", b"h")]);
    }

    #[tokio::test]
    async fn should_leave_unused_sinks_untouched() {
        // given - sink 1 never receives a record
        let first = InMemoryStore::new();
        let second = InMemoryStore::new();

        let mut writer = MuxWriter::new(vec![
            Box::new(first.clone()),
            Box::new(second.clone()),
        ]);

        // when
        writer.begin_writing().await.unwrap();
        writer.write_record(record("a", "x", 0)).await.unwrap();
        writer.end_writing().await.unwrap();

        // then - the untouched sink can immediately open its own session
        let mut second = second;
        second.begin_writing().await.unwrap();
        second.end_writing().await.unwrap();
    }

    #[tokio::test]
    async fn should_allow_reusing_the_mux_for_a_second_session() {
        // given
        let sink = InMemoryStore::new();
        let mut writer = MuxWriter::new(vec![Box::new(sink.clone())]);

        writer.begin_writing().await.unwrap();
        writer.write_record(record("a", "1", 0)).await.unwrap();
        writer.end_writing().await.unwrap();

        // when
        writer.begin_writing().await.unwrap();
        writer.write_record(record("b", "2", 0)).await.unwrap();
        writer.end_writing().await.unwrap();

        // then
        let mut sink = sink;
        let records = read_all(&mut sink).await;
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    #[should_panic(expected = "cannot be routed by a mux with 2 sinks")]
    async fn should_panic_on_out_of_range_tag() {
        let mut writer = MuxWriter::new(vec![
            Box::new(InMemoryStore::new()),
            Box::new(InMemoryStore::new()),
        ]);
        writer.begin_writing().await.unwrap();
        writer.write_record(record("a", "x", 2)).await.unwrap();
    }

    #[tokio::test]
    #[should_panic(expected = "write_record called outside a write session")]
    async fn should_panic_on_write_outside_session() {
        let mut writer = MuxWriter::new(vec![Box::new(InMemoryStore::new())]);
        writer.write_record(record("a", "x", 0)).await.unwrap();
    }
}
