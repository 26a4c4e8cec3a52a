//! Loader metrics
//!
//! Lock-free counters shared by the fetch worker and the client, rendered
//! in Prometheus text format with a `loader` label on every sample.

use std::fmt::{self, Write};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Upper bounds of the `Next` latency buckets
pub const NEXT_LATENCY_BOUNDS: &[Duration] = &[
    Duration::from_micros(500),
    Duration::from_millis(1),
    Duration::from_millis(5),
    Duration::from_millis(10),
    Duration::from_millis(25),
    Duration::from_millis(50),
    Duration::from_millis(100),
    Duration::from_millis(250),
    Duration::from_secs(1),
];

/// Name and help text of one metric family
#[derive(Debug, Clone, Copy)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
}

impl MetricDesc {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self { name, help }
    }

    fn write_preamble(&self, kind: &str, out: &mut String) -> fmt::Result {
        writeln!(out, "# HELP {} {}", self.name, self.help)?;
        writeln!(out, "# TYPE {} {}", self.name, kind)
    }
}

/// A metric family that can render itself for one loader
pub trait Exposition {
    fn desc(&self) -> &MetricDesc;

    /// Append HELP, TYPE and sample lines to `out`
    fn write_to(&self, loader: &str, out: &mut String) -> fmt::Result;
}

/// Monotonic count
#[derive(Debug)]
pub struct Counter {
    desc: MetricDesc,
    value: AtomicU64,
}

impl Counter {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            desc: MetricDesc::new(name, help),
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Exposition for Counter {
    fn desc(&self) -> &MetricDesc {
        &self.desc
    }

    fn write_to(&self, loader: &str, out: &mut String) -> fmt::Result {
        self.desc.write_preamble("counter", out)?;
        writeln!(out, "{}{{loader=\"{}\"}} {}", self.desc.name, loader, self.get())
    }
}

/// Level that moves both ways, such as queue depth
#[derive(Debug)]
pub struct Gauge {
    desc: MetricDesc,
    value: AtomicI64,
}

impl Gauge {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            desc: MetricDesc::new(name, help),
            value: AtomicI64::new(0),
        }
    }

    pub fn set(&self, val: i64) {
        self.value.store(val, Ordering::Relaxed);
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Exposition for Gauge {
    fn desc(&self) -> &MetricDesc {
        &self.desc
    }

    fn write_to(&self, loader: &str, out: &mut String) -> fmt::Result {
        self.desc.write_preamble("gauge", out)?;
        writeln!(out, "{}{{loader=\"{}\"}} {}", self.desc.name, loader, self.get())
    }
}

/// Latency distribution over fixed bounds
///
/// Each observation lands in exactly one slot: the first bound it does not
/// exceed, or the overflow slot. Cumulative bucket counts are built at render
/// time.
#[derive(Debug)]
pub struct LatencyHistogram {
    desc: MetricDesc,
    bounds: &'static [Duration],
    /// `bounds.len() + 1` slots, the last one for values above every bound
    slots: Box<[AtomicU64]>,
    sum_nanos: AtomicU64,
}

impl LatencyHistogram {
    pub fn new(name: &'static str, help: &'static str, bounds: &'static [Duration]) -> Self {
        Self {
            desc: MetricDesc::new(name, help),
            bounds,
            slots: (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect(),
            sum_nanos: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, elapsed: Duration) {
        let slot = self.bounds.partition_point(|bound| *bound < elapsed);
        self.slots[slot].fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.sum_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.slots.iter().map(|s| s.load(Ordering::Relaxed)).sum()
    }

    pub fn sum(&self) -> Duration {
        Duration::from_nanos(self.sum_nanos.load(Ordering::Relaxed))
    }
}

impl Exposition for LatencyHistogram {
    fn desc(&self) -> &MetricDesc {
        &self.desc
    }

    fn write_to(&self, loader: &str, out: &mut String) -> fmt::Result {
        let name = self.desc.name;
        self.desc.write_preamble("histogram", out)?;
        let mut cumulative = 0;
        for (bound, slot) in self.bounds.iter().zip(self.slots.iter()) {
            cumulative += slot.load(Ordering::Relaxed);
            writeln!(
                out,
                "{name}_bucket{{loader=\"{loader}\",le=\"{}\"}} {cumulative}",
                bound.as_secs_f64()
            )?;
        }
        let count = self.count();
        writeln!(out, "{name}_bucket{{loader=\"{loader}\",le=\"+Inf\"}} {count}")?;
        writeln!(out, "{name}_sum{{loader=\"{loader}\"}} {}", self.sum().as_secs_f64())?;
        writeln!(out, "{name}_count{{loader=\"{loader}\"}} {count}")
    }
}

/// Metrics of one loader, shared between its worker and client
#[derive(Debug)]
pub struct LoaderMetrics {
    pub records_fetched: Counter,
    pub next_rpcs: Counter,
    pub empty_polls: Counter,
    pub rpc_retries: Counter,
    pub records_read: Counter,
    pub bytes_read: Counter,
    pub queue_depth: Gauge,
    pub next_latency: LatencyHistogram,
}

impl LoaderMetrics {
    pub fn new() -> Self {
        Self {
            records_fetched: Counter::new(
                "joader_records_fetched_total",
                "Record locations pushed onto the data queue",
            ),
            next_rpcs: Counter::new("joader_next_rpcs_total", "Successful Next calls"),
            empty_polls: Counter::new(
                "joader_empty_polls_total",
                "Next calls that returned no records",
            ),
            rpc_retries: Counter::new("joader_rpc_retries_total", "Retried worker RPCs"),
            records_read: Counter::new(
                "joader_records_read_total",
                "Records read from shared memory",
            ),
            bytes_read: Counter::new(
                "joader_bytes_read_total",
                "Payload bytes read from shared memory",
            ),
            queue_depth: Gauge::new("joader_queue_depth", "Records waiting in the data queue"),
            next_latency: LatencyHistogram::new(
                "joader_next_duration_seconds",
                "Next RPC latency",
                NEXT_LATENCY_BOUNDS,
            ),
        }
    }

    fn families(&self) -> [&dyn Exposition; 8] {
        [
            &self.records_fetched,
            &self.next_rpcs,
            &self.empty_polls,
            &self.rpc_retries,
            &self.records_read,
            &self.bytes_read,
            &self.queue_depth,
            &self.next_latency,
        ]
    }

    /// Render every family for `loader` in Prometheus text format
    pub fn export(&self, loader: &str) -> String {
        let mut out = String::new();
        for family in self.families() {
            // Writing into a String cannot fail
            let _ = family.write_to(loader, &mut out);
        }
        out
    }
}

impl Default for LoaderMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(metric: &dyn Exposition) -> String {
        let mut out = String::new();
        metric.write_to("l0", &mut out).unwrap();
        out
    }

    #[test]
    fn test_counter() {
        let counter = Counter::new("test_counter", "Test counter");
        counter.inc();
        counter.inc_by(5);
        assert_eq!(counter.get(), 6);

        let text = render(&counter);
        assert!(text.starts_with("# HELP test_counter Test counter\n# TYPE test_counter counter\n"));
        assert!(text.contains("test_counter{loader=\"l0\"} 6"));
    }

    #[test]
    fn test_gauge() {
        let gauge = Gauge::new("test_gauge", "Test gauge");
        gauge.set(10);
        gauge.dec();
        gauge.inc();
        gauge.dec();
        assert_eq!(gauge.get(), 9);
        assert!(render(&gauge).contains("# TYPE test_gauge gauge"));
    }

    #[test]
    fn test_histogram_buckets_are_cumulative() {
        static BOUNDS: &[Duration] = &[Duration::from_millis(1), Duration::from_millis(10)];
        let histogram = LatencyHistogram::new("test_histogram", "Test histogram", BOUNDS);
        histogram.observe(Duration::from_micros(200));
        histogram.observe(Duration::from_millis(1));
        histogram.observe(Duration::from_millis(4));
        histogram.observe(Duration::from_secs(3));

        assert_eq!(histogram.count(), 4);
        assert_eq!(histogram.sum(), Duration::from_micros(3_005_200));

        let text = render(&histogram);
        assert!(text.contains("test_histogram_bucket{loader=\"l0\",le=\"0.001\"} 2"));
        assert!(text.contains("test_histogram_bucket{loader=\"l0\",le=\"0.01\"} 3"));
        assert!(text.contains("test_histogram_bucket{loader=\"l0\",le=\"+Inf\"} 4"));
        assert!(text.contains("test_histogram_count{loader=\"l0\"} 4"));
    }

    #[test]
    fn test_export_lists_every_metric() {
        let metrics = LoaderMetrics::new();
        metrics.records_fetched.inc_by(3);
        let text = metrics.export("dummy_loader");
        assert!(text.contains("joader_records_fetched_total{loader=\"dummy_loader\"} 3"));
        assert!(text.contains("joader_queue_depth"));
        assert!(text.contains("joader_next_duration_seconds_count"));
        for family in metrics.families() {
            assert_eq!(text.matches(&format!("# TYPE {} ", family.desc().name)).count(), 1);
        }
    }
}
