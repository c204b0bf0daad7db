//! Collectors: one per backend service.
//!
//! Every collector implements [`Collector`] and is driven by the exporter
//! through a `BTreeMap<String, Box<dyn Collector>>` built from the
//! configuration by [`build_collectors`].

mod aspects;
pub mod connection;
pub mod e2t;
pub mod profile;
pub mod topo;

pub use connection::connect;
pub use e2t::OnosE2tCollector;
pub use profile::OnosProfileCollector;
pub use topo::OnosTopoCollector;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{ExporterConfig, ONOS_E2T, ONOS_PROFILE, ONOS_TOPO};
use crate::error::Result;
use crate::kpis::{Kpi, KpiBuilders};

/// A source of KPI records.
///
/// A call either returns every KPI the collector produces or fails with the
/// first error; partial results are never returned.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Collector name, as used in the configuration.
    fn name(&self) -> &str;

    /// Query the backend and build fresh KPI records.
    async fn collect(&self) -> Result<Vec<Box<dyn Kpi>>>;
}

/// Instantiate one collector per configured entry.
pub fn build_collectors(
    config: &ExporterConfig,
    builders: &KpiBuilders,
) -> Result<BTreeMap<String, Box<dyn Collector>>> {
    let mut collectors: BTreeMap<String, Box<dyn Collector>> = BTreeMap::new();

    for (name, target) in &config.collectors {
        let collector: Box<dyn Collector> = match name.as_str() {
            ONOS_E2T => Box::new(OnosE2tCollector::new(
                target.clone(),
                config.subscriptions.revision_format,
                builders.e2t.clone(),
            )),
            ONOS_TOPO => Box::new(OnosTopoCollector::new(target.clone(), builders.topo.clone())),
            ONOS_PROFILE => Box::new(OnosProfileCollector::new(
                target.address.clone(),
                config.profile.clone(),
                builders.profile.clone(),
            )?),
            other => {
                debug!(collector = %other, "Skipping unknown collector");
                continue;
            }
        };

        collectors.insert(name.clone(), collector);
    }

    Ok(collectors)
}
