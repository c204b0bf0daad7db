use std::sync::Arc;

use super::{KpiRecord, KpiRow};
use crate::render::Builder;

/// One e2t subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct E2tSubscription {
    pub id: String,
    pub revision: String,
    pub service_model_name: String,
    pub service_model_version: String,
    pub e2_node_id: String,
    pub encoding: String,
    pub status_phase: String,
    pub status_state: String,
}

impl KpiRow for E2tSubscription {
    const LABELS: &'static [&'static str] = &[
        "id",
        "revision",
        "service_model_name",
        "service_model_version",
        "node_id",
        "encoding",
        "status_phase",
        "status_state",
    ];

    fn label_values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.revision.clone(),
            self.service_model_name.clone(),
            self.service_model_version.clone(),
            self.e2_node_id.clone(),
            self.encoding.clone(),
            self.status_phase.clone(),
            self.status_state.clone(),
        ]
    }
}

/// `onos_e2t_subscriptions`
pub fn e2t_subscriptions(builder: Arc<Builder>) -> KpiRecord<E2tSubscription> {
    KpiRecord::new("subscriptions", "The e2t subscriptions", builder)
}
