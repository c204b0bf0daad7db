use std::sync::Arc;

use super::{KpiRecord, KpiRow};
use crate::render::Builder;

/// A topology entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopoEntity {
    pub id: String,
    pub kind: String,
    /// `key=value` pairs joined with commas.
    pub labels: String,
    /// Aspect type names joined with commas.
    pub aspects: String,
}

impl KpiRow for TopoEntity {
    const LABELS: &'static [&'static str] = &["entityid", "kind", "labels", "aspects"];

    fn label_values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.kind.clone(),
            self.labels.clone(),
            self.aspects.clone(),
        ]
    }
}

/// A topology relation between two entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopoRelation {
    pub id: String,
    pub kind: String,
    pub source: String,
    pub target: String,
    pub labels: String,
    pub aspects: String,
}

impl KpiRow for TopoRelation {
    const LABELS: &'static [&'static str] =
        &["relationid", "kind", "source", "target", "labels", "aspects"];

    fn label_values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.kind.clone(),
            self.source.clone(),
            self.target.clone(),
            self.labels.clone(),
            self.aspects.clone(),
        ]
    }
}

/// One RAN slice configured on an E2 node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopoEntitySlice {
    pub node_id: String,
    pub kind: String,
    pub slice_id: String,
    pub slice_desc: String,
    pub scheduler_type: String,
    pub weight: String,
    pub qos_level: String,
    pub slice_type: String,
    pub ue_id_list: String,
}

impl TopoEntitySlice {
    /// Row identity: `<node_id>-<slice_id>`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.node_id, self.slice_id)
    }
}

impl KpiRow for TopoEntitySlice {
    const LABELS: &'static [&'static str] = &[
        "entityid",
        "kind",
        "slice_id",
        "slice_desc",
        "scheduler_type",
        "weight",
        "qoslevel",
        "slice_type",
        "ue_id_list",
    ];

    fn label_values(&self) -> Vec<String> {
        vec![
            self.node_id.clone(),
            self.kind.clone(),
            self.slice_id.clone(),
            self.slice_desc.clone(),
            self.scheduler_type.clone(),
            self.weight.clone(),
            self.qos_level.clone(),
            self.slice_type.clone(),
            self.ue_id_list.clone(),
        ]
    }
}

/// `onos_topo_entities`
pub fn topo_entities(builder: Arc<Builder>) -> KpiRecord<TopoEntity> {
    KpiRecord::new("entities", "The onos topo entities", builder)
}

/// `onos_topo_relations`
pub fn topo_relations(builder: Arc<Builder>) -> KpiRecord<TopoRelation> {
    KpiRecord::new("relations", "The onos topo relations", builder)
}

/// `onos_topo_slices`
pub fn topo_slices(builder: Arc<Builder>) -> KpiRecord<TopoEntitySlice> {
    KpiRecord::new("slices", "The onos topo slices", builder)
}
