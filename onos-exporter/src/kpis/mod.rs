//! KPI records: named metric families and the rows that populate them.
//!
//! A record is created fresh every cycle by one of the factory functions
//! below, filled once by a collector and rendered once by the exporter.

mod e2t;
mod profile;
mod topo;

pub use e2t::{E2tSubscription, e2t_subscriptions};
pub use profile::{ProfileObject, onos_profile_heap};
pub use topo::{TopoEntity, TopoEntitySlice, TopoRelation, topo_entities, topo_relations, topo_slices};

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::render::{Builder, ConstMetric};

/// Namespace of every KPI metric.
pub const NAMESPACE: &str = "onos";

/// Constant label naming the subsystem that produced a metric.
pub const SUBSYSTEM_LABEL: &str = "sdran";

/// A row type with a fixed, ordered label schema.
pub trait KpiRow: Debug + Send + Sync {
    /// Label names, in rendering order.
    const LABELS: &'static [&'static str];

    /// Label values, in the same order as [`KpiRow::LABELS`].
    fn label_values(&self) -> Vec<String>;

    /// Sample value. Descriptive rows are rendered as `1`.
    fn value(&self) -> f64 {
        1.0
    }
}

/// A rendered-on-demand KPI family, as returned by collectors.
pub trait Kpi: Debug + Send + Sync {
    /// Metric name relative to the builder's namespace and subsystem.
    fn name(&self) -> &str;

    /// Number of rows.
    fn len(&self) -> usize;

    /// Whether the record has no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert every row into a gauge sample.
    fn prometheus_format(&self) -> Result<Vec<ConstMetric>>;
}

/// One metric family plus its rows, keyed by row identity.
#[derive(Debug, Clone)]
pub struct KpiRecord<R> {
    name: String,
    description: String,
    labels: Vec<String>,
    rows: HashMap<String, R>,
    builder: Arc<Builder>,
}

impl<R: KpiRow> KpiRecord<R> {
    /// Create an empty record with the row type's label schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>, builder: Arc<Builder>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            labels: R::LABELS.iter().map(|l| l.to_string()).collect(),
            rows: HashMap::new(),
            builder,
        }
    }

    /// Override the label schema.
    ///
    /// Rendering fails if the new schema does not match the row arity.
    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.labels = labels;
    }

    /// Insert a row; an existing row with the same key is replaced.
    pub fn insert(&mut self, key: impl Into<String>, row: R) {
        self.rows.insert(key.into(), row);
    }

    /// Look up a row by key.
    pub fn get(&self, key: &str) -> Option<&R> {
        self.rows.get(key)
    }
}

impl<R: KpiRow + 'static> Kpi for KpiRecord<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn prometheus_format(&self) -> Result<Vec<ConstMetric>> {
        let desc = self
            .builder
            .new_metric_desc(&self.name, &self.description, &self.labels);

        self.rows
            .values()
            .map(|row| {
                self.builder
                    .new_const_metric(&desc, row.value(), row.label_values())
            })
            .collect()
    }
}

/// Metric builders shared by collectors, one per subsystem.
#[derive(Debug, Clone)]
pub struct KpiBuilders {
    pub e2t: Arc<Builder>,
    pub topo: Arc<Builder>,
    pub profile: Arc<Builder>,
}

impl KpiBuilders {
    /// Builders under the `onos` namespace, labelled `sdran=<subsystem>`.
    pub fn new() -> Self {
        Self {
            e2t: Arc::new(subsystem_builder("e2t")),
            topo: Arc::new(subsystem_builder("topo")),
            profile: Arc::new(subsystem_builder("profile")),
        }
    }
}

impl Default for KpiBuilders {
    fn default() -> Self {
        Self::new()
    }
}

fn subsystem_builder(subsystem: &str) -> Builder {
    Builder::new(NAMESPACE, subsystem, [(SUBSYSTEM_LABEL, subsystem)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExporterError;

    #[test]
    fn test_builders_namespaces() {
        let builders = KpiBuilders::new();
        assert_eq!(builders.e2t.namespace(), "onos");
        assert_eq!(builders.e2t.subsystem(), "e2t");
        assert_eq!(builders.topo.subsystem(), "topo");
        assert_eq!(builders.profile.subsystem(), "profile");
    }

    #[test]
    fn test_record_insert_overwrites() {
        let builders = KpiBuilders::new();
        let mut record = onos_profile_heap(builders.profile.clone());

        record.insert("a-heap-f", ProfileObject::new("f", 1, "a", "heap"));
        record.insert("a-heap-f", ProfileObject::new("f", 7, "a", "heap"));

        assert_eq!(record.len(), 1);
        assert_eq!(record.get("a-heap-f").map(|r| r.value), Some(7));
    }

    #[test]
    fn test_prometheus_format_is_idempotent() {
        let builders = KpiBuilders::new();
        let mut record = onos_profile_heap(builders.profile.clone());
        record.insert("a-heap-f", ProfileObject::new("f", 1, "a", "heap"));
        record.insert("a-cpu-g", ProfileObject::new("g", 2, "a", "cpu"));

        let mut first = record.prometheus_format().unwrap();
        let mut second = record.prometheus_format().unwrap();
        first.sort_by(|a, b| a.label_values().cmp(b.label_values()));
        second.sort_by(|a, b| a.label_values().cmp(b.label_values()));

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_label_arity_mismatch_is_render_error() {
        let builders = KpiBuilders::new();
        let mut record = onos_profile_heap(builders.profile.clone());
        record.insert("a-heap-f", ProfileObject::new("f", 1, "a", "heap"));
        record.set_labels(vec!["name".to_string(), "source".to_string()]);

        assert!(matches!(
            record.prometheus_format(),
            Err(ExporterError::Render {
                expected: 2,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_record_renders_nothing() {
        let builders = KpiBuilders::new();
        let record = topo_entities(builders.topo.clone());
        assert!(record.is_empty());
        assert!(record.prometheus_format().unwrap().is_empty());
    }
}
