//! I/O accounting for store backends.
//!
//! Counters are owned by whoever builds the store and injected with
//! `with_stats`; nothing here is process-global. A single handle can be
//! shared across every store in a pipeline to aggregate, or one handle per
//! store to attribute.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::record::Record;

/// Counters for records and bytes moved through a store.
#[derive(Debug, Default)]
pub struct StoreStats {
    records_read: AtomicU64,
    bytes_read: AtomicU64,
    records_written: AtomicU64,
    bytes_written: AtomicU64,
    seeks: AtomicU64,
}

impl StoreStats {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts one record delivered by a reader.
    pub fn record_read(&self, record: &Record) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read
            .fetch_add(record.size() as u64, Ordering::Relaxed);
    }

    /// Accounts one record accepted by a writer.
    pub fn record_written(&self, record: &Record) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(record.size() as u64, Ordering::Relaxed);
    }

    /// Accounts one cursor reposition.
    pub fn seek(&self) {
        self.seeks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn records_read(&self) -> u64 {
        self.records_read.load(Ordering::Relaxed)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn seeks(&self) -> u64 {
        self.seeks.load(Ordering::Relaxed)
    }
}

#[cfg(feature = "metrics")]
pub use self::metrics::StoreMetrics;

#[cfg(feature = "metrics")]
mod metrics {
    //! Bridge from [`StoreStats`] to prometheus-client.
    //!
    //! Counters are registered as gauges because the atomic counters expose
    //! absolute values and prometheus-client's `Counter` only supports
    //! `inc()`/`inc_by()`, not `set()`. Prometheus `rate()` still works on
    //! gauges for computing per-second rates.

    use std::sync::Arc;

    use prometheus_client::metrics::gauge::Gauge;
    use prometheus_client::registry::Registry;

    use super::StoreStats;

    /// A single gauge paired with the counter value it reads from.
    struct StatGauge {
        gauge: Gauge<i64>,
        read: fn(&StoreStats) -> u64,
    }

    /// Bridges a [`StoreStats`] handle to a prometheus-client `Registry`.
    ///
    /// On each call to [`refresh()`](StoreMetrics::refresh), reads current
    /// counter values and updates the corresponding Prometheus gauges.
    /// Call `refresh()` before encoding the registry.
    pub struct StoreMetrics {
        stats: Arc<StoreStats>,
        gauges: Vec<StatGauge>,
    }

    impl StoreMetrics {
        /// Registers all counters into the given registry under a `store`
        /// sub-registry prefix.
        pub fn register(stats: Arc<StoreStats>, registry: &mut Registry) -> Self {
            let sub = registry.sub_registry_with_prefix("store");
            let specs: [(&str, &str, fn(&StoreStats) -> u64); 5] = [
                ("records_read", "Records delivered by readers", StoreStats::records_read),
                ("bytes_read", "Bytes delivered by readers", StoreStats::bytes_read),
                ("records_written", "Records accepted by writers", StoreStats::records_written),
                ("bytes_written", "Bytes accepted by writers", StoreStats::bytes_written),
                ("seeks", "Cursor repositions", StoreStats::seeks),
            ];

            let mut gauges = Vec::with_capacity(specs.len());
            for (name, help, read) in specs {
                let gauge = Gauge::<i64, _>::default();
                sub.register(name, help, gauge.clone());
                gauges.push(StatGauge { gauge, read });
            }

            Self { stats, gauges }
        }

        /// Refresh all gauge values from the counters. Call before encoding.
        pub fn refresh(&self) {
            for sg in &self.gauges {
                sg.gauge.set((sg.read)(&self.stats) as i64);
            }
        }
    }
}
