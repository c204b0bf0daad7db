//! Prometheus exporter for ONOS.
//!
//! The exporter periodically queries ONOS services and exposes their state
//! via an HTTP `/metrics` endpoint:
//!
//! - `onos-e2t`: e2t subscriptions
//! - `onos-topo`: topology entities, relations and RAN slices
//! - `onos-profile`: pprof heap, cpu and goroutine profiles of any service
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   Collectors    │────>│    Exporter     │────>│   HTTP Server   │
//! │ (gRPC / pprof)  │     │   (snapshot)    │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Every cycle is a full refresh: collectors build fresh KPI records, the
//! exporter renders them and replaces each collector's snapshot entry.
//!
//! # Usage
//!
//! ```bash
//! onos-exporter --config config.json5
//! ```
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod collect;
pub mod config;
pub mod error;
pub mod exporter;
pub mod http;
pub mod kpis;
pub mod render;

pub use collect::{Collector, build_collectors};
pub use config::ExporterConfig;
pub use error::{ExporterError, Result};
pub use exporter::{Exporter, SharedExporter};
pub use http::HttpServer;
