use std::sync::Arc;

use super::{KpiRecord, KpiRow};
use crate::render::Builder;

/// Flat weight of one symbol in one profile of one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileObject {
    pub name: String,
    pub value: i64,
    /// Address the profile was fetched from.
    pub source: String,
    /// Profile kind: heap, cpu or goroutine.
    pub format: String,
}

impl ProfileObject {
    pub fn new(
        name: impl Into<String>,
        value: i64,
        source: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            source: source.into(),
            format: format.into(),
        }
    }

    /// Row identity: `<source>-<format>-<name>`.
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.source, self.format, self.name)
    }
}

impl KpiRow for ProfileObject {
    const LABELS: &'static [&'static str] = &["name", "source", "format"];

    fn label_values(&self) -> Vec<String> {
        vec![self.name.clone(), self.source.clone(), self.format.clone()]
    }

    fn value(&self) -> f64 {
        self.value as f64
    }
}

/// `onos_profile_heap`
///
/// Despite the name the family carries every profile kind; `format`
/// distinguishes them.
pub fn onos_profile_heap(builder: Arc<Builder>) -> KpiRecord<ProfileObject> {
    KpiRecord::new("heap", "The onos heap profile", builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpis::{Kpi, KpiBuilders};

    #[test]
    fn test_profile_object_key() {
        let obj = ProfileObject::new("runtime.mallocgc", 42, "onos-topo", "heap");
        assert_eq!(obj.key(), "onos-topo-heap-runtime.mallocgc");
    }

    #[test]
    fn test_profile_value_cast() {
        let builders = KpiBuilders::new();
        let mut record = onos_profile_heap(builders.profile.clone());
        let obj = ProfileObject::new("main.work", -1024, "onos-e2t", "cpu");
        record.insert(obj.key(), obj);

        let metrics = record.prometheus_format().unwrap();
        assert_eq!(metrics[0].value(), -1024.0);
        assert_eq!(metrics[0].desc().fq_name, "onos_profile_heap");
        assert_eq!(metrics[0].label("format"), Some("cpu"));
    }
}
