//! Metric builders, const metric instances and text exposition encoding.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

use crate::error::{ExporterError, Result};

/// Join namespace, subsystem and name into a fully-qualified metric name.
///
/// Empty components are skipped.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Immutable description of one metric family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDesc {
    /// Fully-qualified metric name.
    pub fq_name: String,
    /// HELP text.
    pub help: String,
    /// Ordered variable label names.
    pub variable_labels: Vec<String>,
    /// Constant label pairs, sorted by name.
    pub const_labels: Vec<(String, String)>,
}

/// A single gauge sample bound to a [`MetricDesc`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConstMetric {
    desc: Arc<MetricDesc>,
    label_values: Vec<String>,
    value: f64,
}

impl ConstMetric {
    /// The family this sample belongs to.
    pub fn desc(&self) -> &MetricDesc {
        &self.desc
    }

    /// Variable label values, in the order of `desc().variable_labels`.
    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Sample value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Look up a variable label value by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .variable_labels
            .iter()
            .position(|label| label == name)
            .map(|i| self.label_values[i].as_str())
    }

    /// All label pairs: constant labels first, then variable labels.
    pub fn label_pairs(&self) -> Vec<(&str, &str)> {
        self.desc
            .const_labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(
                self.desc
                    .variable_labels
                    .iter()
                    .map(String::as_str)
                    .zip(self.label_values.iter().map(String::as_str)),
            )
            .collect()
    }
}

/// Builds metric descriptions and samples for one KPI family.
///
/// Builders are created once at startup and shared (read-only) between the
/// collector filling a record and the record rendering itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builder {
    namespace: String,
    subsystem: String,
    static_labels: BTreeMap<String, String>,
}

impl Builder {
    /// Create a builder with constant labels attached to every family.
    pub fn new<K, V>(
        namespace: impl Into<String>,
        subsystem: impl Into<String>,
        static_labels: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            namespace: namespace.into(),
            subsystem: subsystem.into(),
            static_labels: static_labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Namespace component of generated names.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Subsystem component of generated names.
    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// Describe a metric family with the given variable labels.
    pub fn new_metric_desc(&self, name: &str, help: &str, labels: &[String]) -> Arc<MetricDesc> {
        Arc::new(MetricDesc {
            fq_name: build_fq_name(&self.namespace, &self.subsystem, name),
            help: help.to_string(),
            variable_labels: labels.to_vec(),
            const_labels: self
                .static_labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// Create a gauge sample.
    ///
    /// Fails when the number of label values differs from the family's
    /// declared variable labels.
    pub fn new_const_metric(
        &self,
        desc: &Arc<MetricDesc>,
        value: f64,
        label_values: Vec<String>,
    ) -> Result<ConstMetric> {
        if label_values.len() != desc.variable_labels.len() {
            return Err(ExporterError::Render {
                metric: desc.fq_name.clone(),
                expected: desc.variable_labels.len(),
                actual: label_values.len(),
            });
        }

        Ok(ConstMetric {
            desc: desc.clone(),
            label_values,
            value,
        })
    }
}

/// Encode samples in the text exposition format.
///
/// Samples are grouped into families by name; families and samples are
/// sorted so the output is stable between scrapes.
pub fn encode_text(out: &mut String, metrics: &[ConstMetric]) {
    let mut by_name: BTreeMap<&str, Vec<&ConstMetric>> = BTreeMap::new();
    for metric in metrics {
        by_name.entry(&metric.desc.fq_name).or_default().push(metric);
    }

    for (name, mut series) in by_name {
        series.sort_by(|a, b| a.label_values.cmp(&b.label_values));

        writeln!(out, "# HELP {} {}", name, escape_help(&series[0].desc.help)).ok();
        writeln!(out, "# TYPE {} gauge", name).ok();

        for metric in series {
            writeln!(
                out,
                "{}{} {}",
                name,
                format_labels(&metric.label_pairs()),
                format_value(metric.value)
            )
            .ok();
        }
    }
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape special characters in HELP text.
fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a floating point value for Prometheus.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Format labels for the exposition format.
fn format_labels(labels: &[(&str, &str)]) -> String {
    if labels.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    format!("{{{}}}", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_fq_name() {
        assert_eq!(build_fq_name("onos", "topo", "entities"), "onos_topo_entities");
        assert_eq!(build_fq_name("onos", "", "heap"), "onos_heap");
        assert_eq!(build_fq_name("", "", "heap"), "heap");
    }

    #[test]
    fn test_metric_desc_carries_static_labels() {
        let builder = Builder::new("onos", "e2t", [("sdran", "e2t")]);
        let desc = builder.new_metric_desc("subscriptions", "The e2t subscriptions", &labels(&["id"]));

        assert_eq!(desc.fq_name, "onos_e2t_subscriptions");
        assert_eq!(
            desc.const_labels,
            vec![("sdran".to_string(), "e2t".to_string())]
        );
    }

    #[test]
    fn test_const_metric_arity_mismatch() {
        let builder = Builder::new("onos", "profile", [("sdran", "profile")]);
        let desc = builder.new_metric_desc("heap", "heap", &labels(&["name", "source", "format"]));

        let result = builder.new_const_metric(&desc, 1.0, vec!["main.main".to_string()]);
        assert!(matches!(
            result,
            Err(ExporterError::Render {
                expected: 3,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_const_metric_label_lookup() {
        let builder = Builder::new("onos", "topo", Vec::<(String, String)>::new());
        let desc = builder.new_metric_desc("entities", "entities", &labels(&["entityid", "kind"]));
        let metric = builder
            .new_const_metric(&desc, 1.0, vec!["e2:1".to_string(), "e2node".to_string()])
            .unwrap();

        assert_eq!(metric.label("kind"), Some("e2node"));
        assert_eq!(metric.label("missing"), None);
        assert_eq!(metric.label_pairs(), vec![("entityid", "e2:1"), ("kind", "e2node")]);
    }

    #[test]
    fn test_encode_text() {
        let builder = Builder::new("onos", "profile", [("sdran", "profile")]);
        let desc = builder.new_metric_desc("heap", "The onos heap profile", &labels(&["name"]));
        let metrics = vec![
            builder
                .new_const_metric(&desc, 2048.0, vec!["runtime.malg".to_string()])
                .unwrap(),
            builder
                .new_const_metric(&desc, 512.0, vec!["main.\"quoted\"".to_string()])
                .unwrap(),
        ];

        let mut out = String::new();
        encode_text(&mut out, &metrics);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "# HELP onos_profile_heap The onos heap profile");
        assert_eq!(lines[1], "# TYPE onos_profile_heap gauge");
        assert_eq!(
            lines[2],
            "onos_profile_heap{sdran=\"profile\",name=\"main.\\\"quoted\\\"\"} 512"
        );
        assert_eq!(
            lines[3],
            "onos_profile_heap{sdran=\"profile\",name=\"runtime.malg\"} 2048"
        );
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("simple"), "simple");
        assert_eq!(escape_label_value("with\"quote"), "with\\\"quote");
        assert_eq!(escape_label_value("with\\backslash"), "with\\\\backslash");
        assert_eq!(escape_label_value("with\nnewline"), "with\\nnewline");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(3.5), "3.5");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
    }
}
