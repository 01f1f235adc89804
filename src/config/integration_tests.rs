// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{load_and_validate_config, load_config, RuntimeBuilder};
use crate::consumer::Disposition;
use crate::domain::Finding;
use crate::errors::ConfigError;
use crate::steps::{SendFeedback, Verdict};

fn write_config(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

/// Test that the shipped configuration loads and passes validation
#[test]
fn test_remediation_yaml_loading() {
    let config = load_and_validate_config("configs/remediation.yaml").unwrap();

    assert_eq!(config.runner.step_timeout_seconds, 90);
    assert_eq!(config.runner.finalizer_grace_seconds, 10);
    assert_eq!(config.telemetry.wait_seconds, 10);
    assert_eq!(config.consumer.max_concurrent_alerts, 4);
    assert_eq!(config.lookup_timeout(), Duration::from_secs(30));
    let enabled: Vec<&str> = config
        .notification
        .channels
        .iter()
        .filter(|c| c.enabled)
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(enabled, vec!["connectivity-ops", "site-ops"]);
    assert_eq!(config.consumer.iot_hub_connection_strings.len(), 2);
    assert_eq!(config.simulation.gateways.len(), 5);
    assert_eq!(config.simulation.gateways[0].connector_name, "bms-north");
    assert!(!config.simulation.gateways[1].online);

    let settings = config.remediation_settings();
    assert_eq!(settings.runner.step_timeout, Duration::from_secs(90));
    assert_eq!(settings.telemetry_poll_interval, Duration::from_secs(2));
}

#[test]
fn test_missing_file_is_io_error() {
    let result = load_config("configs/does-not-exist.yaml");
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[test]
fn test_unparseable_file_is_parse_error() {
    let file = write_config("runner: [not, a, map]\n");
    let result = load_config(file.path());
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_simulated_hub_without_connection_string_fails_validation() {
    let file = write_config(
        r#"
simulation:
  gateways:
    - connector_name: bms-north
      connector_id: c-17
      device_name: gw-01
      iot_hub_name: hub-east
"#,
    );

    let error = load_and_validate_config(file.path()).unwrap_err().to_string();
    assert!(error.contains("hub-east"), "{}", error);
}

/// Test every sample alert against the simulated fleet from the shipped configuration
#[tokio::test(start_paused = true)]
async fn test_sample_alerts_end_to_end() {
    let config = load_and_validate_config("configs/remediation.yaml").unwrap();
    let (consumer, gateways) = RuntimeBuilder::simulated(&config).unwrap();

    let cases = vec![
        ("resolved-by-restart", Some(Verdict::ResolvedByRestart)),
        ("device-offline", Some(Verdict::DeviceOffline)),
        (
            "network-unreachable",
            Some(Verdict::NetworkUnreachable {
                addresses: vec!["10.40.0.5".parse().unwrap()],
            }),
        ),
        ("unresolved", Some(Verdict::Unresolved { restarted: true })),
        ("unknown-connector", None),
        ("malformed", None),
    ];

    for (alert, expected_verdict) in &cases {
        let payload = std::fs::read(format!("configs/alerts/{}.json", alert)).unwrap();
        let disposition = consumer
            .handle_payload(&payload, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(disposition.context().is_some(), expected_verdict.is_some(), "alert {}", alert);
        if *alert == "malformed" {
            assert!(matches!(disposition, Disposition::Rejected { .. }));
        }
    }

    let payload = std::fs::read("configs/alerts/restart-failure.json").unwrap();
    let disposition = consumer
        .handle_payload(&payload, &CancellationToken::new())
        .await
        .unwrap();
    assert!(disposition.context().unwrap().termination().unwrap().is_failure());

    // Redelivery of an alert that was already reported runs again but pages nobody.
    let payload = std::fs::read("configs/alerts/unresolved.json").unwrap();
    let redelivered = consumer
        .handle_payload(&payload, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        redelivered.context().unwrap().outcome_of(SendFeedback::NAME).unwrap().finding,
        Finding::FeedbackSent {
            delivered: vec![],
            suppressed: vec!["connectivity-ops".to_string(), "site-ops".to_string()],
            failed: vec![],
        }
    );
    assert!(gateways.delivered_to("on-call").await.is_empty());

    let delivered = gateways.delivered().await;
    let verdicts: Vec<Verdict> = delivered.iter().map(|r| r.verdict.clone()).collect();
    let mut expected: Vec<Verdict> = cases.into_iter().filter_map(|(_, v)| v).collect();
    expected.push(Verdict::DiagnosisFailed {
        step: "restart_edge_module".to_string(),
        reason: "module manager is unavailable: restart of module 'access-control' failed".to_string(),
    });
    assert_eq!(verdicts, expected);
}
