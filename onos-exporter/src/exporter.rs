//! Collection orchestrator and exposition snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::collect::{Collector, build_collectors};
use crate::config::ExporterConfig;
use crate::error::Result;
use crate::kpis::KpiBuilders;
use crate::render::{ConstMetric, encode_text};

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct CollectionLabels {
    collector: String,
    result: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct CollectorLabels {
    collector: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KpiLabels {
    collector: String,
    kpi: String,
}

/// The exporter's own metrics.
struct SelfMetrics {
    registry: Registry,
    collections: Family<CollectionLabels, Counter>,
    duration: Family<CollectorLabels, Gauge<f64, AtomicU64>>,
    rows: Family<KpiLabels, Gauge>,
}

impl SelfMetrics {
    fn new() -> Self {
        let mut registry = Registry::with_prefix("onos_exporter");

        let collections = Family::<CollectionLabels, Counter>::default();
        registry.register(
            "collections",
            "Collector runs by result",
            collections.clone(),
        );

        let duration = Family::<CollectorLabels, Gauge<f64, AtomicU64>>::default();
        registry.register(
            "collection_duration_seconds",
            "Duration of the last collector run",
            duration.clone(),
        );

        let rows = Family::<KpiLabels, Gauge>::default();
        registry.register("kpi_rows", "Rows in the last collected KPI", rows.clone());

        Self {
            registry,
            collections,
            duration,
            rows,
        }
    }
}

/// Rendered output of one collector's last successful run.
#[derive(Debug, Clone, Default)]
struct CollectorSnapshot {
    metrics: Vec<ConstMetric>,
    /// `(kpi name, row count)` per KPI.
    kpis: Vec<(String, usize)>,
}

/// Outcome of one collection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub succeeded: usize,
    pub failed: usize,
}

/// Drives collectors on a timer and serves their last rendered output.
pub struct Exporter {
    collectors: BTreeMap<String, Box<dyn Collector>>,
    interval: Duration,
    snapshot: RwLock<BTreeMap<String, CollectorSnapshot>>,
    self_metrics: SelfMetrics,
    cycles: AtomicU64,
}

/// Create a shareable exporter handle.
pub type SharedExporter = Arc<Exporter>;

impl Exporter {
    /// Create an exporter over the given collectors.
    pub fn new(collectors: BTreeMap<String, Box<dyn Collector>>, interval: Duration) -> Self {
        Self {
            collectors,
            interval,
            snapshot: RwLock::new(BTreeMap::new()),
            self_metrics: SelfMetrics::new(),
            cycles: AtomicU64::new(0),
        }
    }

    /// Create an exporter with one collector per configured entry.
    pub fn from_config(config: &ExporterConfig) -> Result<Self> {
        let collectors = build_collectors(config, &KpiBuilders::new())?;
        Ok(Self::new(collectors, Duration::from_secs(config.exporter.interval_secs)))
    }

    /// Names of the configured collectors.
    pub fn collector_names(&self) -> Vec<&str> {
        self.collectors.keys().map(String::as_str).collect()
    }

    /// Run every collector once, in name order.
    ///
    /// A successful run replaces the collector's snapshot entry; a failed run
    /// removes it.
    pub async fn run_cycle(&self) -> CycleStats {
        let mut stats = CycleStats::default();

        for (name, collector) in &self.collectors {
            let start = Instant::now();
            let result = self.collect_one(collector.as_ref()).await;
            let elapsed = start.elapsed();

            self.self_metrics
                .duration
                .get_or_create(&CollectorLabels {
                    collector: name.clone(),
                })
                .set(elapsed.as_secs_f64());

            let outcome = match result {
                Ok(snapshot) => {
                    debug!(
                        collector = %name,
                        series = snapshot.metrics.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Collection succeeded"
                    );
                    self.record_rows(name, &snapshot.kpis);
                    self.snapshot.write().insert(name.clone(), snapshot);
                    stats.succeeded += 1;
                    "success"
                }
                Err(e) => {
                    error!(collector = %name, error = %e, "Collection failed");
                    let stale = self.snapshot.write().remove(name);
                    if let Some(stale) = stale {
                        let cleared: Vec<(String, usize)> =
                            stale.kpis.into_iter().map(|(kpi, _)| (kpi, 0)).collect();
                        self.record_rows(name, &cleared);
                    }
                    stats.failed += 1;
                    "error"
                }
            };

            self.self_metrics
                .collections
                .get_or_create(&CollectionLabels {
                    collector: name.clone(),
                    result: outcome.to_string(),
                })
                .inc();
        }

        self.cycles.fetch_add(1, Ordering::Relaxed);
        stats
    }

    async fn collect_one(&self, collector: &dyn Collector) -> Result<CollectorSnapshot> {
        let kpis = collector.collect().await?;

        let mut snapshot = CollectorSnapshot::default();
        for kpi in &kpis {
            let metrics = kpi.prometheus_format()?;
            snapshot.kpis.push((kpi.name().to_string(), kpi.len()));
            snapshot.metrics.extend(metrics);
        }

        Ok(snapshot)
    }

    fn record_rows(&self, collector: &str, kpis: &[(String, usize)]) {
        for (kpi, rows) in kpis {
            self.self_metrics
                .rows
                .get_or_create(&KpiLabels {
                    collector: collector.to_string(),
                    kpi: kpi.clone(),
                })
                .set(*rows as i64);
        }
    }

    /// Run collection cycles until the shutdown signal is received.
    ///
    /// The first cycle starts immediately. A cycle is never interrupted.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.interval.as_secs(),
            collectors = ?self.collector_names(),
            "Starting collection loop"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let stats = self.run_cycle().await;
                    debug!(
                        succeeded = stats.succeeded,
                        failed = stats.failed,
                        series = self.series_count(),
                        "Collection cycle complete"
                    );
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Collection loop stopped");
    }

    /// Number of completed collection cycles.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Ready once the first cycle has completed.
    pub fn is_ready(&self) -> bool {
        self.cycles_completed() > 0
    }

    /// Number of KPI series currently served.
    pub fn series_count(&self) -> usize {
        self.snapshot.read().values().map(|s| s.metrics.len()).sum()
    }

    /// Metrics currently served for one collector.
    pub fn collector_metrics(&self, name: &str) -> Option<Vec<ConstMetric>> {
        self.snapshot.read().get(name).map(|s| s.metrics.clone())
    }

    /// Render the snapshot followed by the exporter's own metrics.
    pub fn render(&self) -> String {
        let metrics: Vec<ConstMetric> = self
            .snapshot
            .read()
            .values()
            .flat_map(|s| s.metrics.iter().cloned())
            .collect();

        let mut output = String::with_capacity(metrics.len() * 128);
        encode_text(&mut output, &metrics);

        if let Err(e) = prometheus_client::encoding::text::encode(&mut output, &self.self_metrics.registry) {
            error!(error = %e, "Failed to encode exporter metrics");
        }

        output
    }
}
