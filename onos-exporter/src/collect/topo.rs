//! Topology collector for onos-topo.

use std::sync::Arc;

use async_trait::async_trait;
use onos_exporter_api::topo::{Filters, ListRequest, Object, object, topo_client::TopoClient};
use tonic::transport::Channel;
use tracing::{debug, warn};

use super::aspects::{decode_slice_list, is_slice_list};
use super::{Collector, connect};
use crate::config::{CollectorConfig, ONOS_TOPO};
use crate::error::{ExporterError, Result};
use crate::kpis::{
    Kpi, KpiRecord, TopoEntity, TopoEntitySlice, TopoRelation, topo_entities, topo_relations,
    topo_slices,
};
use crate::render::Builder;

/// Access to the topology store.
#[async_trait]
pub trait TopoBackend: Send + Sync {
    /// List every object of the given type.
    async fn list_objects(&self, object_type: object::Type) -> Result<Vec<Object>>;
}

/// gRPC-backed [`TopoBackend`].
pub struct GrpcTopoBackend {
    client: TopoClient<Channel>,
}

impl GrpcTopoBackend {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: TopoClient::new(channel),
        }
    }
}

#[async_trait]
impl TopoBackend for GrpcTopoBackend {
    async fn list_objects(&self, object_type: object::Type) -> Result<Vec<Object>> {
        let mut client = self.client.clone();
        let request = ListRequest {
            filters: Some(Filters {
                object_types: vec![object_type as i32],
            }),
        };
        let response = client.list(request).await?.into_inner();
        Ok(response.objects)
    }
}

/// Collects `onos_topo_entities`, `onos_topo_slices` and `onos_topo_relations`.
pub struct OnosTopoCollector {
    config: CollectorConfig,
    builder: Arc<Builder>,
}

impl OnosTopoCollector {
    pub fn new(config: CollectorConfig, builder: Arc<Builder>) -> Self {
        Self { config, builder }
    }

    /// Build the KPIs from an already-connected backend.
    pub async fn collect_from<B: TopoBackend + ?Sized>(&self, backend: &B) -> Result<Vec<Box<dyn Kpi>>> {
        let entities = backend.list_objects(object::Type::Entity).await?;
        debug!(count = entities.len(), "Listed topo entities");

        let entities_kpi = list_entities(&entities, self.builder.clone());
        let slices_kpi = list_slices(&entities, self.builder.clone());
        let relations_kpi = list_relations(backend, self.builder.clone()).await?;

        Ok(vec![
            Box::new(entities_kpi) as Box<dyn Kpi>,
            Box::new(slices_kpi),
            Box::new(relations_kpi),
        ])
    }
}

#[async_trait]
impl Collector for OnosTopoCollector {
    fn name(&self) -> &str {
        ONOS_TOPO
    }

    async fn collect(&self) -> Result<Vec<Box<dyn Kpi>>> {
        let address = self.config.address.trim();
        if address.is_empty() {
            return Err(ExporterError::configuration(
                "onos-topo collector: missing service address",
            ));
        }

        let channel = connect(
            address,
            &self.config.cert_path,
            &self.config.key_path,
            self.config.no_tls,
        )
        .await?;

        let backend = GrpcTopoBackend::new(channel);
        self.collect_from(&backend).await
    }
}

/// Map entity objects to entity rows keyed by object id.
pub fn list_entities(objects: &[Object], builder: Arc<Builder>) -> KpiRecord<TopoEntity> {
    let mut record = topo_entities(builder);

    for obj in objects {
        record.insert(
            obj.id.clone(),
            TopoEntity {
                id: obj.id.clone(),
                kind: entity_kind(obj),
                labels: labels_as_csv(obj),
                aspects: aspects_as_csv(obj),
            },
        );
    }

    record
}

/// Flatten the slice list aspects of entity objects into slice rows.
pub fn list_slices(objects: &[Object], builder: Arc<Builder>) -> KpiRecord<TopoEntitySlice> {
    let mut record = topo_slices(builder);

    for slice in objects.iter().flat_map(entity_slices) {
        record.insert(slice.key(), slice);
    }

    record
}

/// List relation objects and map them to relation rows keyed by object id.
pub async fn list_relations<B: TopoBackend + ?Sized>(
    backend: &B,
    builder: Arc<Builder>,
) -> Result<KpiRecord<TopoRelation>> {
    let mut record = topo_relations(builder);

    let objects = backend.list_objects(object::Type::Relation).await?;
    debug!(count = objects.len(), "Listed topo relations");

    for obj in &objects {
        let (kind, source, target) = match &obj.obj {
            Some(object::Obj::Relation(r)) => (
                r.kind_id.clone(),
                r.src_entity_id.clone(),
                r.tgt_entity_id.clone(),
            ),
            _ => Default::default(),
        };

        record.insert(
            obj.id.clone(),
            TopoRelation {
                id: obj.id.clone(),
                kind,
                source,
                target,
                labels: labels_as_csv(obj),
                aspects: aspects_as_csv(obj),
            },
        );
    }

    Ok(record)
}

fn entity_kind(obj: &Object) -> String {
    match &obj.obj {
        Some(object::Obj::Entity(e)) => e.kind_id.clone(),
        _ => String::new(),
    }
}

/// Slice rows of one entity. Malformed aspects are logged and skipped.
fn entity_slices(obj: &Object) -> Vec<TopoEntitySlice> {
    let kind = entity_kind(obj);

    obj.aspects
        .iter()
        .filter(|(aspect_type, _)| is_slice_list(aspect_type))
        .filter_map(|(aspect_type, any)| match decode_slice_list(&any.value) {
            Ok(list) => Some(list),
            Err(e) => {
                warn!(entity = %obj.id, aspect = %aspect_type, error = %e, "Skipping malformed aspect");
                None
            }
        })
        .flat_map(|list| list.rsm_slice_list)
        .map(|item| TopoEntitySlice {
            node_id: obj.id.clone(),
            kind: kind.clone(),
            slice_id: item.id.clone(),
            slice_desc: item.slice_desc.clone(),
            scheduler_type: item.scheduler_type(),
            weight: item.weight(),
            qos_level: item.qos_level(),
            slice_type: item.slice_type(),
            ue_id_list: item.ue_id_list(),
        })
        .collect()
}

/// `key=value` pairs sorted by key, joined with commas.
pub fn labels_as_csv(obj: &Object) -> String {
    let mut labels: Vec<_> = obj.labels.iter().collect();
    labels.sort();
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Aspect type names sorted, joined with commas.
pub fn aspects_as_csv(obj: &Object) -> String {
    let mut aspects: Vec<&str> = obj.aspects.keys().map(String::as_str).collect();
    aspects.sort_unstable();
    aspects.join(",")
}
