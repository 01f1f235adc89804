// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Interfaces to the external services the consumer and the steps call.
//!
//! Wire protocols belong to the services; the engine only depends on these traits.
//! In-memory implementations live in [`crate::backends::in_memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{DeviceInfo, GatewayIdentity};
use crate::errors::CollaboratorError;
use crate::steps::FeedbackReport;

/// Maps a connector name to the gateway device and IoT hub it runs on.
#[async_trait]
pub trait DeviceResolver: Send + Sync {
    /// `Ok(None)` when the connector has no known gateway.
    async fn resolve_device_properties(
        &self,
        connector_name: &str,
    ) -> Result<Option<GatewayIdentity>, CollaboratorError>;
}

/// Looks up reachability facts for a gateway device.
#[async_trait]
pub trait DeviceMappingLookup: Send + Sync {
    /// Empty when the device has no mapping.
    async fn lookup_device_info(&self, device_name: &str) -> Result<Vec<DeviceInfo>, CollaboratorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Device twin connectivity queries against an IoT hub.
#[async_trait]
pub trait IotHubClient: Send + Sync {
    async fn device_connection_state(
        &self,
        iot_hub_name: &str,
        connection_string: &str,
        device_name: &str,
    ) -> Result<ConnectionState, CollaboratorError>;
}

/// Network-layer reachability probe for one gateway address.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn is_reachable(&self, device: &DeviceInfo) -> Result<bool, CollaboratorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartResponse {
    Accepted,
    AlreadyRunning,
}

/// Edge module management on the gateway.
#[async_trait]
pub trait ModuleManager: Send + Sync {
    async fn restart_module(
        &self,
        iot_hub_name: &str,
        connection_string: &str,
        device_name: &str,
        module_name: &str,
    ) -> Result<RestartResponse, CollaboratorError>;
}

/// Telemetry ingestion status for a connector.
#[async_trait]
pub trait TelemetryMonitor: Send + Sync {
    /// Whether telemetry from the connector arrived at or after `since`.
    async fn telemetry_resumed(
        &self,
        connector_id: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, CollaboratorError>;
}

/// Operator-facing notification channel.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn channel(&self) -> &str;

    /// Disabled channels are skipped without being called.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Window in which a repeated report for the same alert is not sent to this channel
    /// again. Zero sends every report.
    fn active_alert_ttl(&self) -> Duration {
        Duration::ZERO
    }

    async fn deliver(&self, report: &FeedbackReport) -> Result<(), CollaboratorError>;
}

/// Remembers when an alert was last raised on a channel.
///
/// Keys are `<alert key>:<channel>`, see [`FeedbackReport::alert_key`].
#[async_trait]
pub trait ActiveAlertStore: Send + Sync {
    async fn last_raised(&self, key: &str) -> Result<Option<DateTime<Utc>>, CollaboratorError>;

    async fn record_raised(&self, key: &str, at: DateTime<Utc>) -> Result<(), CollaboratorError>;
}

/// Every service the remediation steps need, handed to the pipeline composition function.
#[derive(Clone)]
pub struct Collaborators {
    pub iot_hub: Arc<dyn IotHubClient>,
    pub network: Arc<dyn NetworkProbe>,
    pub modules: Arc<dyn ModuleManager>,
    pub telemetry: Arc<dyn TelemetryMonitor>,
    /// Reports fan out to every enabled channel.
    pub notifications: Vec<Arc<dyn NotificationSink>>,
    pub active_alerts: Arc<dyn ActiveAlertStore>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels: Vec<&str> = self.notifications.iter().map(|sink| sink.channel()).collect();
        f.debug_struct("Collaborators")
            .field("notification_channels", &channels)
            .finish_non_exhaustive()
    }
}
