//! Range-excluding reader: suppresses records inside closed key intervals.

use async_trait::async_trait;
use bytes::Bytes;
use store::{Error, Record, Result, StoreReader};

/// Streams a source reader, skipping every record whose key falls inside an
/// excluded range.
///
/// The excluded ranges come from a second reader whose records pair up in
/// key order: the first record's key begins a range, the second ends it
/// (inclusive), and so on. Because that reader is sorted, the intervals are
/// ascending and non-overlapping, so a single interval cursor suffices: the
/// filter advances to the next interval once the source moves past the
/// current one. An odd number of boundary records is a programming error
/// and panics.
pub struct RangeExcludingReader {
    source: Box<dyn StoreReader + Send>,
    excluded: Box<dyn StoreReader + Send>,
    current: Option<(Bytes, Bytes)>,
    source_open: bool,
    excluded_open: bool,
    reading: bool,
    failed: Option<Error>,
}

impl RangeExcludingReader {
    /// Creates a filter over `source`, excluding the ranges described by
    /// `excluded`.
    pub fn new(
        source: Box<dyn StoreReader + Send>,
        excluded: Box<dyn StoreReader + Send>,
    ) -> Self {
        Self {
            source,
            excluded,
            current: None,
            source_open: false,
            excluded_open: false,
            reading: false,
            failed: None,
        }
    }

    /// Reads the next boundary pair, if any.
    async fn next_interval(&mut self) -> Result<Option<(Bytes, Bytes)>> {
        let Some(begin) = self.excluded.read_record().await? else {
            return Ok(None);
        };
        let Some(end) = self.excluded.read_record().await? else {
            panic!("excluded-ranges store holds an odd number of boundary records");
        };
        Ok(Some((begin.key, end.key)))
    }

    fn latch(&mut self, error: Error) -> Error {
        self.failed = Some(error.clone());
        error
    }
}

#[async_trait]
impl StoreReader for RangeExcludingReader {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn begin_reading(&mut self) -> Result<()> {
        if self.reading {
            panic!("only one read session may be open on a store at a time");
        }
        self.reading = true;
        if let Err(e) = self.source.begin_reading().await {
            return Err(self.latch(e));
        }
        self.source_open = true;
        if let Err(e) = self.excluded.begin_reading().await {
            return Err(self.latch(e));
        }
        self.excluded_open = true;
        match self.next_interval().await {
            Ok(interval) => {
                self.current = interval;
                Ok(())
            }
            Err(e) => Err(self.latch(e)),
        }
    }

    async fn read_record(&mut self) -> Result<Option<Record>> {
        if let Some(error) = &self.failed {
            return Err(error.clone());
        }
        if !self.reading {
            panic!("read_record called outside a read session");
        }
        loop {
            let record = match self.source.read_record().await {
                Ok(Some(record)) => record,
                Ok(None) => return Ok(None),
                Err(e) => return Err(self.latch(e)),
            };
            // Skip intervals that end before this key.
            loop {
                let past_end = matches!(&self.current, Some((_, end)) if record.key > *end);
                if !past_end {
                    break;
                }
                self.current = match self.next_interval().await {
                    Ok(interval) => interval,
                    Err(e) => return Err(self.latch(e)),
                };
            }
            match &self.current {
                Some((begin, end)) if *begin <= record.key && record.key <= *end => continue,
                _ => return Ok(Some(record)),
            }
        }
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn end_reading(&mut self) -> Result<()> {
        if !self.reading {
            panic!("end_reading called without a matching begin_reading");
        }
        let mut first_error = None;
        if self.source_open {
            if let Err(e) = self.source.end_reading().await {
                first_error.get_or_insert(e);
            }
            self.source_open = false;
        }
        if self.excluded_open {
            if let Err(e) = self.excluded.end_reading().await {
                first_error.get_or_insert(e);
            }
            self.excluded_open = false;
        }
        self.current = None;
        self.reading = false;
        self.failed = None;
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use store::{InMemoryStore, StoreWriter};

    use super::*;
    use crate::testing::FailingReader;

    async fn memory_store(pairs: &[(&str, &str)]) -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.begin_writing().await.unwrap();
        for (key, value) in pairs {
            store
                .write_record(Record::new(
                    Bytes::copy_from_slice(key.as_bytes()),
                    Bytes::copy_from_slice(value.as_bytes()),
                ))
                .await
                .unwrap();
        }
        store.end_writing().await.unwrap();
        store
    }

    async fn drain_keys(reader: &mut RangeExcludingReader) -> Vec<Bytes> {
        let mut keys = Vec::new();
        reader.begin_reading().await.unwrap();
        while let Some(record) = reader.read_record().await.unwrap() {
            keys.push(record.key);
        }
        reader.end_reading().await.unwrap();
        keys
    }

    #[tokio::test]
    async fn should_skip_keys_inside_excluded_ranges() {
        // given - keys a..h, j, k with ranges [c,e] and [h,i] excluded
        let source = memory_store(&[
            ("a", "x"),
            ("b", "y"),
            ("c", "z"),
            ("d", "y"),
            ("e", "x"),
            ("f", "a"),
            ("g", "b"),
            ("h", "c"),
            ("j", "e"),
            ("k", "f"),
        ])
        .await;
        let excluded =
            memory_store(&[("c", ""), ("e", ""), ("h", ""), ("i", "")]).await;

        // when
        let mut reader = RangeExcludingReader::new(Box::new(source), Box::new(excluded));
        let keys = drain_keys(&mut reader).await;

        // then
        assert_eq!(
            keys,
            vec![
                Bytes::from("a"),
                Bytes::from("b"),
                Bytes::from("f"),
                Bytes::from("g"),
                Bytes::from("j"),
                Bytes::from("k"),
            ]
        );
    }

    #[tokio::test]
    async fn should_pass_everything_through_when_no_ranges_given() {
        // given
        let source = memory_store(&[("a", "1"), ("b", "2")]).await;
        let excluded = memory_store(&[]).await;

        // when
        let mut reader = RangeExcludingReader::new(Box::new(source), Box::new(excluded));
        let keys = drain_keys(&mut reader).await;

        // then
        assert_eq!(keys, vec![Bytes::from("a"), Bytes::from("b")]);
    }

    #[tokio::test]
    async fn should_exclude_range_covering_the_whole_source() {
        // given
        let source = memory_store(&[("b", "1"), ("c", "2"), ("d", "3")]).await;
        let excluded = memory_store(&[("a", "begin"), ("z", "end")]).await;

        // when
        let mut reader = RangeExcludingReader::new(Box::new(source), Box::new(excluded));
        let keys = drain_keys(&mut reader).await;

        // then
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn should_treat_range_ends_as_inclusive() {
        // given - range [b,c]: both boundary keys themselves are excluded
        let source = memory_store(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]).await;
        let excluded = memory_store(&[("b", ""), ("c", "")]).await;

        // when
        let mut reader = RangeExcludingReader::new(Box::new(source), Box::new(excluded));
        let keys = drain_keys(&mut reader).await;

        // then
        assert_eq!(keys, vec![Bytes::from("a"), Bytes::from("d")]);
    }

    #[tokio::test]
    #[should_panic(expected = "odd number of boundary records")]
    async fn should_panic_on_unpaired_boundary_record() {
        let source = memory_store(&[("a", "1")]).await;
        let excluded = memory_store(&[("b", "lonely")]).await;

        let mut reader = RangeExcludingReader::new(Box::new(source), Box::new(excluded));
        reader.begin_reading().await.unwrap();
    }

    #[tokio::test]
    async fn should_latch_source_error_and_still_close_both_readers() {
        // given
        let source = FailingReader::new(
            vec![Record::new(Bytes::from("a"), Bytes::from("1"))],
            1,
        );
        let excluded = memory_store(&[]).await;

        let mut reader = RangeExcludingReader::new(Box::new(source), Box::new(excluded));
        reader.begin_reading().await.unwrap();

        // when
        let first = reader.read_record().await.unwrap();
        assert_eq!(first.unwrap().key, Bytes::from("a"));
        let error = reader.read_record().await.unwrap_err();

        // then
        assert!(error.to_string().contains("injected read failure"));
        let replayed = reader.read_record().await.unwrap_err();
        assert_eq!(replayed, error);
        reader.end_reading().await.unwrap();
    }
}
