//! Subscription collector for onos-e2t.

use std::sync::Arc;

use async_trait::async_trait;
use onos_exporter_api::e2t::{
    Encoding, ListSubscriptionsRequest, Subscription, SubscriptionPhase, SubscriptionState,
    subscription_admin_service_client::SubscriptionAdminServiceClient,
};
use tonic::transport::Channel;
use tracing::debug;

use super::{Collector, connect};
use crate::config::{CollectorConfig, ONOS_E2T, RevisionFormat};
use crate::error::{ExporterError, Result};
use crate::kpis::{E2tSubscription, Kpi, KpiRecord, e2t_subscriptions};
use crate::render::Builder;

/// Access to the e2t subscription registry.
#[async_trait]
pub trait SubscriptionBackend: Send + Sync {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>>;
}

/// gRPC-backed [`SubscriptionBackend`].
pub struct GrpcSubscriptionBackend {
    client: SubscriptionAdminServiceClient<Channel>,
}

impl GrpcSubscriptionBackend {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: SubscriptionAdminServiceClient::new(channel),
        }
    }
}

#[async_trait]
impl SubscriptionBackend for GrpcSubscriptionBackend {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        // Generated clients take `&mut self`; the clone shares the channel.
        let mut client = self.client.clone();
        let response = client
            .list_subscriptions(ListSubscriptionsRequest {})
            .await?
            .into_inner();
        Ok(response.subscriptions)
    }
}

/// Collects `onos_e2t_subscriptions`.
pub struct OnosE2tCollector {
    config: CollectorConfig,
    revision_format: RevisionFormat,
    builder: Arc<Builder>,
}

impl OnosE2tCollector {
    pub fn new(config: CollectorConfig, revision_format: RevisionFormat, builder: Arc<Builder>) -> Self {
        Self {
            config,
            revision_format,
            builder,
        }
    }

    /// Build the KPIs from an already-connected backend.
    pub async fn collect_from<B: SubscriptionBackend + ?Sized>(
        &self,
        backend: &B,
    ) -> Result<Vec<Box<dyn Kpi>>> {
        let subscriptions: Box<dyn Kpi> = Box::new(
            list_subscriptions(backend, self.builder.clone(), self.revision_format).await?,
        );
        Ok(vec![subscriptions])
    }
}

#[async_trait]
impl Collector for OnosE2tCollector {
    fn name(&self) -> &str {
        ONOS_E2T
    }

    async fn collect(&self) -> Result<Vec<Box<dyn Kpi>>> {
        let address = self.config.address.trim();
        if address.is_empty() {
            return Err(ExporterError::configuration(
                "onos-e2t collector: missing service address",
            ));
        }

        let channel = connect(
            address,
            &self.config.cert_path,
            &self.config.key_path,
            self.config.no_tls,
        )
        .await?;

        let backend = GrpcSubscriptionBackend::new(channel);
        self.collect_from(&backend).await
    }
}

/// List every subscription and map it to a row keyed by subscription id.
pub async fn list_subscriptions<B: SubscriptionBackend + ?Sized>(
    backend: &B,
    builder: Arc<Builder>,
    revision_format: RevisionFormat,
) -> Result<KpiRecord<E2tSubscription>> {
    let mut record = e2t_subscriptions(builder);

    let subscriptions = backend.list_subscriptions().await?;
    debug!(count = subscriptions.len(), "Listed e2t subscriptions");

    for sub in subscriptions {
        let row = subscription_row(&sub, revision_format);
        record.insert(row.id.clone(), row);
    }

    Ok(record)
}

fn subscription_row(sub: &Subscription, revision_format: RevisionFormat) -> E2tSubscription {
    let meta = sub.subscription_meta.clone().unwrap_or_default();
    let service_model = meta.service_model.unwrap_or_default();
    let (phase, state) = sub
        .status
        .as_ref()
        .map(|s| (s.phase, s.state))
        .unwrap_or_default();

    E2tSubscription {
        id: sub.id.clone(),
        revision: format_revision(sub.revision, revision_format),
        service_model_name: service_model.name,
        service_model_version: service_model.version,
        e2_node_id: meta.e2_node_id,
        encoding: enum_name(meta.encoding, |v| {
            Encoding::try_from(v).ok().map(|e| e.as_str_name())
        }),
        status_phase: enum_name(phase, |v| {
            SubscriptionPhase::try_from(v).ok().map(|p| p.as_str_name())
        }),
        status_state: enum_name(state, |v| {
            SubscriptionState::try_from(v).ok().map(|s| s.as_str_name())
        }),
    }
}

/// Symbolic name of a wire enum value, or its decimal value if unknown.
fn enum_name(value: i32, name: impl Fn(i32) -> Option<&'static str>) -> String {
    name(value)
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

/// Render a subscription revision.
pub fn format_revision(revision: u64, format: RevisionFormat) -> String {
    match format {
        RevisionFormat::Decimal => revision.to_string(),
        RevisionFormat::CodePoint => u32::try_from(revision)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
            .to_string(),
    }
}
