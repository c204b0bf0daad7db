//! Integration tests for the exporter.
//!
//! A local axum server plays the pprof debug endpoint of ONOS services; the
//! tests drive the real HTTP profile source, the exporter and the metrics
//! router end to end.

use std::collections::HashSet;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use flate2::Compression;
use flate2::write::GzEncoder;
use prost::Message;
use tower::ServiceExt;

use onos_exporter::collect::OnosProfileCollector;
use onos_exporter::config::{ONOS_PROFILE, ONOS_TOPO, ProfileConfig};
use onos_exporter::kpis::{Kpi, KpiBuilders};
use onos_exporter::{Collector, Exporter, ExporterConfig, ExporterError};
use onos_exporter_api::pprof::{Function, Line, Location, Profile, Sample, ValueType};

/// A profile whose only sample sits in `sym`.
fn single_symbol_profile(sample_types: &[&str], value: i64) -> Profile {
    let mut string_table = vec![String::new(), "sym".to_string(), "count".to_string()];
    let mut sample_type = Vec::new();
    for st in sample_types {
        string_table.push(st.to_string());
        sample_type.push(ValueType {
            r#type: (string_table.len() - 1) as i64,
            unit: 2,
        });
    }

    Profile {
        sample_type,
        sample: vec![Sample {
            location_id: vec![1],
            value: vec![value; sample_types.len()],
            ..Default::default()
        }],
        location: vec![Location {
            id: 1,
            address: 0x401000,
            line: vec![Line {
                function_id: 1,
                line: 42,
            }],
            ..Default::default()
        }],
        function: vec![Function {
            id: 1,
            name: 1,
            system_name: 1,
            ..Default::default()
        }],
        string_table,
        ..Default::default()
    }
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Serve pprof endpoints on an ephemeral port reachable on every loopback address.
async fn spawn_pprof_server(fail_goroutine: bool) -> SocketAddr {
    let heap = gzip(&single_symbol_profile(&["alloc_space", "inuse_space"], 4096).encode_to_vec());
    let cpu = gzip(&single_symbol_profile(&["samples", "cpu"], 20).encode_to_vec());
    let goroutine = single_symbol_profile(&["goroutine"], 3).encode_to_vec();

    let router = Router::new()
        .route(
            "/debug/pprof/heap",
            get(move || {
                let body = heap.clone();
                async move { body }
            }),
        )
        .route(
            "/debug/pprof/profile",
            get(move || {
                let body = cpu.clone();
                async move { body }
            }),
        )
        .route(
            "/debug/pprof/goroutine",
            get(move || {
                let body = goroutine.clone();
                async move {
                    if fail_goroutine {
                        (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
                    } else {
                        (StatusCode::OK, body)
                    }
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn profile_config(port: u16) -> ProfileConfig {
    ProfileConfig {
        port,
        cpu_seconds: 1,
        node_fraction: 0.0,
    }
}

#[tokio::test]
async fn test_profile_two_addresses_three_kinds() {
    let addr = spawn_pprof_server(false).await;
    let collector = OnosProfileCollector::new(
        "127.0.0.1, 127.0.0.2",
        profile_config(addr.port()),
        KpiBuilders::new().profile,
    )
    .unwrap();

    let kpis = collector.collect().await.unwrap();
    assert_eq!(kpis.len(), 1);
    assert_eq!(kpis[0].len(), 6);

    let metrics = kpis[0].prometheus_format().unwrap();
    let keys: HashSet<String> = metrics
        .iter()
        .map(|m| {
            format!(
                "{}-{}-{}",
                m.label("source").unwrap(),
                m.label("format").unwrap(),
                m.label("name").unwrap()
            )
        })
        .collect();

    for source in ["127.0.0.1", "127.0.0.2"] {
        for format in ["heap", "cpu", "goroutine"] {
            assert!(keys.contains(&format!("{}-{}-sym", source, format)));
        }
    }

    let heap = metrics
        .iter()
        .find(|m| m.label("format") == Some("heap"))
        .unwrap();
    assert_eq!(heap.value(), 4096.0);

    let goroutine = metrics
        .iter()
        .find(|m| m.label("format") == Some("goroutine"))
        .unwrap();
    assert_eq!(goroutine.value(), 3.0);
}

#[tokio::test]
async fn test_profile_single_failure_yields_no_rows() {
    let addr = spawn_pprof_server(true).await;
    let collector = OnosProfileCollector::new(
        "127.0.0.1,127.0.0.2",
        profile_config(addr.port()),
        KpiBuilders::new().profile,
    )
    .unwrap();

    let result = collector.collect().await;
    assert!(matches!(result, Err(ExporterError::Backend(_))));
}

#[tokio::test]
async fn test_exporter_end_to_end() {
    let addr = spawn_pprof_server(false).await;
    let config = ExporterConfig::parse(&format!(
        r#"{{
            exporter: {{ listen: "127.0.0.1:0", interval_secs: 60 }},
            collectors: {{
                "onos-profile": {{ address: "127.0.0.1" }},
                "onos-topo": {{ address: "127.0.0.1:1", no_tls: true }},
            }},
            profile: {{ port: {}, cpu_seconds: 1, node_fraction: 0.0 }},
        }}"#,
        addr.port()
    ))
    .unwrap();

    let exporter = Arc::new(Exporter::from_config(&config).unwrap());
    assert_eq!(exporter.collector_names(), vec![ONOS_PROFILE, ONOS_TOPO]);

    let stats = tokio::time::timeout(Duration::from_secs(30), exporter.run_cycle())
        .await
        .unwrap();
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 1);
    assert!(exporter.collector_metrics(ONOS_TOPO).is_none());
    assert_eq!(exporter.collector_metrics(ONOS_PROFILE).map(|m| m.len()), Some(3));

    let router = onos_exporter::http::create_router(exporter.clone(), "/metrics");
    let response = router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();

    assert!(body.contains("# TYPE onos_profile_heap gauge"));
    assert!(body.contains(
        r#"onos_profile_heap{sdran="profile",name="sym",source="127.0.0.1",format="cpu"} 20"#
    ));
    assert!(!body.contains("onos_topo_entities"));
    assert!(body.contains(r#"onos_exporter_collections_total{collector="onos-topo",result="error"} 1"#));
    assert!(body.ends_with("# EOF\n"));
}
