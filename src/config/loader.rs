// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::in_memory::SimulatedGateway;
use crate::config::consts::{
    DEFAULT_ACTIVE_ALERT_TTL_SECS, DEFAULT_FINALIZER_GRACE_SECS, DEFAULT_LOOKUP_TIMEOUT_SECS,
    DEFAULT_MAX_CONCURRENT_ALERTS, DEFAULT_NOTIFICATION_CHANNEL, DEFAULT_STEP_TIMEOUT_SECS,
    DEFAULT_TELEMETRY_POLL_INTERVAL_SECS, DEFAULT_TELEMETRY_WAIT_SECS,
};
use crate::engine::RunnerOptions;
use crate::errors::ConfigError;
use crate::steps::RemediationSettings;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the remediation service.
///
/// Every section is optional and falls back to built-in defaults.
///
/// # Example
/// ```yaml
/// runner:
///   step_timeout_seconds: 90
///   finalizer_grace_seconds: 10
/// telemetry:
///   wait_seconds: 30
///   poll_interval_seconds: 5
/// consumer:
///   max_concurrent_alerts: 4
///   lookup_timeout_seconds: 30
///   iot_hub_connection_strings:
///     hub-east: "HostName=hub-east.azure-devices.net;SharedAccessKeyName=service;SharedAccessKey=..."
/// notification:
///   channels:
///     - name: connectivity-ops
///       active_alert_ttl_seconds: 3600
///     - name: on-call
///       enabled: false
/// simulation:
///   gateways: []
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub consumer: ConsumerConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Time budgets for the pipeline runner.
///
/// # Fields
/// * `step_timeout_seconds` - Upper bound for one step; keep it below the message lock duration
/// * `finalizer_grace_seconds` - Time the report gets after a cancellation; `0` skips the report
#[derive(Debug, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_step_timeout")]
    pub step_timeout_seconds: u64,
    #[serde(default = "default_finalizer_grace")]
    pub finalizer_grace_seconds: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            step_timeout_seconds: DEFAULT_STEP_TIMEOUT_SECS,
            finalizer_grace_seconds: DEFAULT_FINALIZER_GRACE_SECS,
        }
    }
}

/// Bounded wait used when verifying telemetry after a restart.
#[derive(Debug, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_wait")]
    pub wait_seconds: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            wait_seconds: DEFAULT_TELEMETRY_WAIT_SECS,
            poll_interval_seconds: DEFAULT_TELEMETRY_POLL_INTERVAL_SECS,
        }
    }
}

/// Alert intake settings.
///
/// # Fields
/// * `max_concurrent_alerts` - Alerts processed at the same time, each in its own run
/// * `lookup_timeout_seconds` - Bound for each resolver and device mapping call
/// * `iot_hub_connection_strings` - Service connection string per IoT hub name
#[derive(Debug, Deserialize)]
pub struct ConsumerConfig {
    #[serde(default = "default_max_concurrent_alerts")]
    pub max_concurrent_alerts: usize,
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_seconds: u64,
    #[serde(default)]
    pub iot_hub_connection_strings: HashMap<String, String>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_alerts: DEFAULT_MAX_CONCURRENT_ALERTS,
            lookup_timeout_seconds: DEFAULT_LOOKUP_TIMEOUT_SECS,
            iot_hub_connection_strings: HashMap::new(),
        }
    }
}

/// Channels feedback reports fan out to.
#[derive(Debug, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
        }
    }
}

/// One notification channel.
///
/// # Fields
/// * `enabled` - Disabled channels receive nothing
/// * `active_alert_ttl_seconds` - Repeated reports for the same alert within this window are
///   not sent again; `0` sends every report
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_active_alert_ttl")]
    pub active_alert_ttl_seconds: u64,
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            active_alert_ttl_seconds: DEFAULT_ACTIVE_ALERT_TTL_SECS,
        }
    }

    pub fn active_alert_ttl(&self) -> Duration {
        Duration::from_secs(self.active_alert_ttl_seconds)
    }
}

/// Gateways backing the in-memory collaborators.
#[derive(Debug, Default, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub gateways: Vec<SimulatedGateway>,
}

fn default_step_timeout() -> u64 {
    DEFAULT_STEP_TIMEOUT_SECS
}

fn default_finalizer_grace() -> u64 {
    DEFAULT_FINALIZER_GRACE_SECS
}

fn default_telemetry_wait() -> u64 {
    DEFAULT_TELEMETRY_WAIT_SECS
}

fn default_poll_interval() -> u64 {
    DEFAULT_TELEMETRY_POLL_INTERVAL_SECS
}

fn default_max_concurrent_alerts() -> usize {
    DEFAULT_MAX_CONCURRENT_ALERTS
}

fn default_lookup_timeout() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_SECS
}

fn default_channels() -> Vec<ChannelConfig> {
    vec![ChannelConfig::new(DEFAULT_NOTIFICATION_CHANNEL)]
}

fn default_enabled() -> bool {
    true
}

fn default_active_alert_ttl() -> u64 {
    DEFAULT_ACTIVE_ALERT_TTL_SECS
}

impl Config {
    /// Checks cross-field rules. Every violation is collected before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.runner.step_timeout_seconds == 0 {
            errors.push("runner.step_timeout_seconds must be greater than zero".to_string());
        }
        if self.telemetry.wait_seconds == 0 {
            errors.push("telemetry.wait_seconds must be greater than zero".to_string());
        }
        if self.telemetry.poll_interval_seconds == 0 {
            errors.push("telemetry.poll_interval_seconds must be greater than zero".to_string());
        }
        if self.telemetry.poll_interval_seconds > self.telemetry.wait_seconds {
            errors.push(format!(
                "telemetry.poll_interval_seconds ({}) must not exceed telemetry.wait_seconds ({})",
                self.telemetry.poll_interval_seconds, self.telemetry.wait_seconds
            ));
        }
        if self.telemetry.wait_seconds >= self.runner.step_timeout_seconds {
            errors.push(format!(
                "telemetry.wait_seconds ({}) must be below runner.step_timeout_seconds ({})",
                self.telemetry.wait_seconds, self.runner.step_timeout_seconds
            ));
        }
        if self.consumer.max_concurrent_alerts == 0 {
            errors.push("consumer.max_concurrent_alerts must be at least 1".to_string());
        }
        if self.consumer.lookup_timeout_seconds == 0 {
            errors.push("consumer.lookup_timeout_seconds must be greater than zero".to_string());
        }
        let mut channel_names = HashSet::new();
        for channel in &self.notification.channels {
            if channel.name.trim().is_empty() {
                errors.push("notification.channels entries need a name".to_string());
            } else if !channel_names.insert(channel.name.as_str()) {
                errors.push(format!("notification channel '{}' is listed twice", channel.name));
            }
        }
        for gateway in &self.simulation.gateways {
            if !self
                .consumer
                .iot_hub_connection_strings
                .contains_key(&gateway.iot_hub_name)
            {
                errors.push(format!(
                    "simulated gateway '{}' uses IoT hub '{}' which has no connection string",
                    gateway.connector_name, gateway.iot_hub_name
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            step_timeout: Duration::from_secs(self.runner.step_timeout_seconds),
            finalizer_grace: Duration::from_secs(self.runner.finalizer_grace_seconds),
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.consumer.lookup_timeout_seconds)
    }

    pub fn remediation_settings(&self) -> RemediationSettings {
        RemediationSettings {
            runner: self.runner_options(),
            telemetry_wait: Duration::from_secs(self.telemetry.wait_seconds),
            telemetry_poll_interval: Duration::from_secs(self.telemetry.poll_interval_seconds),
        }
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load and validate a config from a YAML file
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();

        assert_eq!(cfg.runner.step_timeout_seconds, DEFAULT_STEP_TIMEOUT_SECS);
        assert_eq!(cfg.runner.finalizer_grace_seconds, DEFAULT_FINALIZER_GRACE_SECS);
        assert_eq!(cfg.telemetry.wait_seconds, DEFAULT_TELEMETRY_WAIT_SECS);
        assert_eq!(cfg.consumer.max_concurrent_alerts, DEFAULT_MAX_CONCURRENT_ALERTS);
        assert_eq!(cfg.consumer.lookup_timeout_seconds, DEFAULT_LOOKUP_TIMEOUT_SECS);
        assert_eq!(cfg.notification.channels, vec![ChannelConfig::new(DEFAULT_NOTIFICATION_CHANNEL)]);
        assert!(cfg.simulation.gateways.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_partial_sections() {
        let yaml = r#"
runner:
  finalizer_grace_seconds: 0
consumer:
  iot_hub_connection_strings:
    hub-east: "HostName=hub-east"
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(cfg.runner.step_timeout_seconds, DEFAULT_STEP_TIMEOUT_SECS);
        assert_eq!(cfg.runner_options().finalizer_grace, Duration::ZERO);
        assert_eq!(cfg.consumer.iot_hub_connection_strings["hub-east"], "HostName=hub-east");
    }

    #[test]
    fn test_validation_rules() {
        let cases = vec![
            ("zero step timeout", "runner: { step_timeout_seconds: 0 }", "runner.step_timeout_seconds"),
            ("zero poll interval", "telemetry: { poll_interval_seconds: 0 }", "poll_interval_seconds must be greater"),
            (
                "poll longer than wait",
                "telemetry: { wait_seconds: 10, poll_interval_seconds: 20 }",
                "must not exceed",
            ),
            (
                "wait outlives step",
                "runner: { step_timeout_seconds: 30 }\ntelemetry: { wait_seconds: 30 }",
                "must be below runner.step_timeout_seconds",
            ),
            ("no concurrency", "consumer: { max_concurrent_alerts: 0 }", "max_concurrent_alerts"),
            ("zero lookup timeout", "consumer: { lookup_timeout_seconds: 0 }", "lookup_timeout_seconds"),
            ("blank channel", "notification: { channels: [ { name: ' ' } ] }", "need a name"),
            (
                "duplicate channel",
                "notification: { channels: [ { name: ops }, { name: ops, enabled: false } ] }",
                "'ops' is listed twice",
            ),
        ];

        for (label, yaml, expected) in cases {
            let cfg: Config = serde_yaml::from_str(yaml).unwrap();
            let error = cfg.validate().unwrap_err().to_string();
            assert!(error.contains(expected), "case {}: {}", label, error);
        }
    }

    #[test]
    fn parse_notification_channels() {
        let yaml = r#"
notification:
  channels:
    - name: connectivity-ops
    - name: on-call
      enabled: false
      active_alert_ttl_seconds: 0
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(cfg.notification.channels.len(), 2);
        assert!(cfg.notification.channels[0].enabled);
        assert_eq!(
            cfg.notification.channels[0].active_alert_ttl(),
            Duration::from_secs(DEFAULT_ACTIVE_ALERT_TTL_SECS)
        );
        assert!(!cfg.notification.channels[1].enabled);
        assert_eq!(cfg.notification.channels[1].active_alert_ttl(), Duration::ZERO);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validation_reports_all_errors_together() {
        let yaml = r#"
runner: { step_timeout_seconds: 0 }
consumer: { max_concurrent_alerts: 0 }
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();

        match cfg.validate() {
            Err(ConfigError::Invalid(errors)) => assert!(errors.len() >= 2),
            other => panic!("Expected invalid config, got {:?}", other),
        }
    }
}
