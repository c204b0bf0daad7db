//! Integration tests for onos-exporter-common.

use std::io::Write;

use onos_exporter_common::{Error, LogFormat, LoggingConfig, load_config};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SampleConfig {
    address: String,
    #[serde(default)]
    logging: LoggingConfig,
}

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{
            // comments and trailing commas are fine in JSON5
            address: "onos-topo:5150",
            logging: {{ level: "warn", format: "json", }},
        }}"#
    )
    .unwrap();

    let config: SampleConfig = load_config(file.path()).unwrap();

    assert_eq!(config.address, "onos-topo:5150");
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_load_config_parse_failure_names_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{{ address: ").unwrap();

    let result: Result<SampleConfig, Error> = load_config(file.path());
    let message = result.unwrap_err().to_string();

    assert!(message.contains("Failed to parse config file"));
    assert!(message.contains(&file.path().display().to_string()));
}
