//! Grouper: two-level iteration over a sorted stream by decoded key prefix.

use bytes::Bytes;
use lexkey::{FieldType, Value};
use store::{Record, StoreReader};

use crate::error::Result;

/// One peeked record together with its decoded prefix.
struct Peeked {
    record: Record,
    prefix: Bytes,
    values: Vec<Value>,
}

/// The prefix identifying the group currently being iterated.
struct ActiveGroup {
    prefix: Bytes,
    values: Vec<Value>,
}

/// Partitions a sorted record stream into groups of equal key prefix.
///
/// The schema names the typed fields at the front of every key; records
/// whose keys decode to the same prefix tuple form one group. Because the
/// source is ascending and the tuple encoding is order-preserving, each
/// group is a contiguous run, so grouping needs only a single peeked
/// record of lookahead.
///
/// Iteration is two-level: [`next_group`](Grouper::next_group) advances to
/// the next distinct prefix, [`next_record`](Grouper::next_record) advances
/// within the group, and [`read`](Grouper::read) returns the current record
/// with its full key, prefix included. Before the first
/// `next_group`/`next_record` pair there is no current record.
///
/// # Example
///
/// ```ignore
/// let mut grouper = Grouper::open(reader, vec![FieldType::Str, FieldType::I32]).await?;
/// while grouper.next_group().await? {
///     println!("group {:?}", grouper.group_key());
///     while grouper.next_record().await? {
///         let record = grouper.read();
///         // ...
///     }
/// }
/// grouper.close().await?;
/// ```
pub struct Grouper {
    source: Box<dyn StoreReader + Send>,
    schema: Vec<FieldType>,
    pending: Option<Peeked>,
    current: Option<Record>,
    active: Option<ActiveGroup>,
    exhausted: bool,
}

impl Grouper {
    /// Begins a read session on `source` and returns a grouper over it.
    pub async fn open(
        mut source: Box<dyn StoreReader + Send>,
        schema: Vec<FieldType>,
    ) -> Result<Self> {
        source.begin_reading().await?;
        Ok(Self {
            source,
            schema,
            pending: None,
            current: None,
            active: None,
            exhausted: false,
        })
    }

    /// Advances to the next group, discarding any unread records of the
    /// current one. Returns `false` once the stream is exhausted.
    pub async fn next_group(&mut self) -> Result<bool> {
        if self.pending.is_none() && !self.exhausted {
            self.fetch().await?;
        }
        if let Some(active_prefix) = self.active.as_ref().map(|a| a.prefix.clone()) {
            loop {
                let same_group =
                    matches!(&self.pending, Some(peeked) if peeked.prefix == active_prefix);
                if !same_group {
                    break;
                }
                self.pending = None;
                if self.exhausted {
                    break;
                }
                self.fetch().await?;
            }
        }
        self.current = None;
        match &self.pending {
            Some(peeked) => {
                self.active = Some(ActiveGroup {
                    prefix: peeked.prefix.clone(),
                    values: peeked.values.clone(),
                });
                Ok(true)
            }
            None => {
                self.active = None;
                Ok(false)
            }
        }
    }

    /// Advances to the next record of the current group. Returns `false`
    /// when the prefix changes or the stream ends.
    ///
    /// Panics if called before the first [`next_group`](Grouper::next_group).
    pub async fn next_record(&mut self) -> Result<bool> {
        let active_prefix = self
            .active
            .as_ref()
            .map(|a| a.prefix.clone())
            .expect("next_record called before next_group");
        if self.pending.is_none() && !self.exhausted {
            self.fetch().await?;
        }
        match self.pending.take() {
            Some(peeked) if peeked.prefix == active_prefix => {
                self.current = Some(peeked.record);
                Ok(true)
            }
            other => {
                // The peeked record belongs to the next group; leave it.
                self.pending = other;
                self.current = None;
                Ok(false)
            }
        }
    }

    /// Returns the current record, prefix still present in its key.
    ///
    /// Panics when there is no current record.
    pub fn read(&self) -> &Record {
        self.current
            .as_ref()
            .expect("no current record; call next_group and next_record first")
    }

    /// Returns the decoded prefix of the active group.
    ///
    /// Panics when no group is active.
    pub fn group_key(&self) -> &[Value] {
        self.active
            .as_ref()
            .map(|a| a.values.as_slice())
            .expect("no active group; call next_group first")
    }

    /// Ends the source read session.
    pub async fn close(mut self) -> Result<()> {
        self.source.end_reading().await?;
        Ok(())
    }

    async fn fetch(&mut self) -> Result<()> {
        match self.source.read_record().await? {
            None => self.exhausted = true,
            Some(record) => {
                let (values, consumed) = lexkey::decode_prefix(&record.key, &self.schema)?;
                let prefix = record.key.slice(0..consumed);
                self.pending = Some(Peeked {
                    record,
                    prefix,
                    values,
                });
            }
        }
        Ok(())
    }
}
