//! Profile collector: samples pprof endpoints of ONOS services.
//!
//! For every configured address the collector fetches the heap, cpu and
//! goroutine profiles in that order, generates a flat text report for each
//! and folds the `(function, flat)` pairs into the `onos_profile_heap` KPI.
//! Payloads are spooled into a scratch directory owned by the call and
//! removed when it returns.

mod fetch;
pub(crate) mod report;

pub use fetch::{HttpProfileSource, ProfileSource, decode_profile, read_profile};
pub use report::{ReportOptions, TextItem, text_items};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::Collector;
use crate::config::{ONOS_PROFILE, ProfileConfig};
use crate::error::{ExporterError, Result};
use crate::kpis::{Kpi, KpiRecord, ProfileObject, onos_profile_heap};
use crate::render::Builder;

/// Profile kinds collected from every address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    Heap,
    Cpu,
    Goroutine,
}

impl ProfileKind {
    /// Collection order.
    pub const ALL: [ProfileKind; 3] = [ProfileKind::Heap, ProfileKind::Cpu, ProfileKind::Goroutine];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Heap => "heap",
            ProfileKind::Cpu => "cpu",
            ProfileKind::Goroutine => "goroutine",
        }
    }

    /// Sample type reported on, `None` for the profile's default.
    pub fn sample_index(&self) -> Option<&'static str> {
        match self {
            ProfileKind::Heap => Some("inuse_space"),
            ProfileKind::Cpu | ProfileKind::Goroutine => None,
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URL of the pprof endpoint serving `kind` on `address`.
pub fn format_address(address: &str, kind: ProfileKind, port: u16, cpu_seconds: u64) -> String {
    match kind {
        ProfileKind::Heap => format!("http://{}:{}/debug/pprof/heap", address, port),
        ProfileKind::Cpu => format!(
            "http://{}:{}/debug/pprof/profile?seconds={}",
            address, port, cpu_seconds
        ),
        ProfileKind::Goroutine => format!("http://{}:{}/debug/pprof/goroutine", address, port),
    }
}

/// Split a comma-delimited address list, dropping empty entries.
pub fn split_addresses(addresses: &str) -> Vec<&str> {
    addresses
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect()
}

/// Collects `onos_profile_heap`.
pub struct OnosProfileCollector<S = HttpProfileSource> {
    addresses: String,
    config: ProfileConfig,
    builder: Arc<Builder>,
    source: S,
}

impl OnosProfileCollector<HttpProfileSource> {
    pub fn new(
        addresses: impl Into<String>,
        config: ProfileConfig,
        builder: Arc<Builder>,
    ) -> Result<Self> {
        Ok(Self::with_source(addresses, config, builder, HttpProfileSource::new()?))
    }
}

impl<S: ProfileSource> OnosProfileCollector<S> {
    /// Create a collector fetching through a custom source.
    pub fn with_source(
        addresses: impl Into<String>,
        config: ProfileConfig,
        builder: Arc<Builder>,
        source: S,
    ) -> Self {
        Self {
            addresses: addresses.into(),
            config,
            builder,
            source,
        }
    }

    /// Fetch and report every `(address, kind)` pair, failing on the first error.
    async fn profiles(&self, addresses: &[&str], scratch: &Path) -> Result<KpiRecord<ProfileObject>> {
        let mut record = onos_profile_heap(self.builder.clone());

        for address in addresses {
            for kind in ProfileKind::ALL {
                let url = format_address(address, kind, self.config.port, self.config.cpu_seconds);
                let path = self.source.fetch(&url, scratch).await?;
                let profile = read_profile(&path).await?;

                let options = ReportOptions {
                    sample_index: kind.sample_index().map(str::to_string),
                    node_fraction: self.config.node_fraction,
                };
                let items = text_items(&profile, &options)?;
                debug!(address = %address, kind = %kind, items = items.len(), "Reported profile");

                for item in items {
                    let obj = ProfileObject::new(item.name, item.flat, *address, kind.as_str());
                    record.insert(obj.key(), obj);
                }
            }
        }

        Ok(record)
    }
}

#[async_trait]
impl<S: ProfileSource> Collector for OnosProfileCollector<S> {
    fn name(&self) -> &str {
        ONOS_PROFILE
    }

    async fn collect(&self) -> Result<Vec<Box<dyn Kpi>>> {
        let addresses = split_addresses(&self.addresses);
        if addresses.is_empty() {
            return Err(ExporterError::configuration(
                "onos-profile collector: missing service address(es)",
            ));
        }

        let scratch = tempfile::Builder::new().prefix("onos-profile-").tempdir()?;
        let scratch_path = scratch.path().to_path_buf();

        let result = self.profiles(&addresses, &scratch_path).await;

        if let Err(e) = scratch.close() {
            warn!(path = %scratch_path.display(), error = %e, "Failed to remove profile scratch directory");
        }

        let record: Box<dyn Kpi> = Box::new(result?);
        Ok(vec![record])
    }
}
