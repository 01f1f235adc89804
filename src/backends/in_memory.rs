// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-memory gateway fleet implementing every collaborator trait.
//!
//! The fleet is described by [`SimulatedGateway`] entries, either built in code or
//! loaded from the `simulation` section of the configuration. All state lives behind
//! one `Arc`, so clones share restart counters, telemetry polls, active alerts and
//! delivered reports. Each configured notification channel becomes its own sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::consts::DEFAULT_NOTIFICATION_CHANNEL;
use crate::config::ChannelConfig;
use crate::domain::{DeviceInfo, GatewayIdentity};
use crate::errors::CollaboratorError;
use crate::steps::FeedbackReport;
use crate::traits::{
    ActiveAlertStore, Collaborators, ConnectionState, DeviceMappingLookup, DeviceResolver, IotHubClient,
    ModuleManager, NetworkProbe, NotificationSink, RestartResponse, TelemetryMonitor,
};

/// One gateway address and whether probes reach it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulatedAddress {
    pub ip: IpAddr,
    #[serde(default = "default_true")]
    pub reachable: bool,
}

/// A connector and the gateway it runs on.
///
/// # Example
/// ```yaml
/// - connector_name: bms-north
///   connector_id: c-17
///   device_name: gw-01
///   iot_hub_name: hub-east
///   addresses:
///     - ip: 10.20.0.4
///   telemetry_resumes_after: 1
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulatedGateway {
    pub connector_name: String,
    pub connector_id: String,
    pub device_name: String,
    pub iot_hub_name: String,
    #[serde(default = "default_true")]
    pub online: bool,
    #[serde(default)]
    pub addresses: Vec<SimulatedAddress>,
    #[serde(default)]
    pub module_running: bool,
    #[serde(default)]
    pub restart_fails: bool,
    /// Negative telemetry polls within one run window before telemetry shows up. Never
    /// when absent.
    #[serde(default)]
    pub telemetry_resumes_after: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl SimulatedGateway {
    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    pub fn address(mut self, ip: IpAddr, reachable: bool) -> Self {
        self.addresses.push(SimulatedAddress { ip, reachable });
        self
    }

    pub fn module_running(mut self, running: bool) -> Self {
        self.module_running = running;
        self
    }

    pub fn restart_fails(mut self, fails: bool) -> Self {
        self.restart_fails = fails;
        self
    }

    pub fn telemetry_resumes_after(mut self, polls: Option<u32>) -> Self {
        self.telemetry_resumes_after = polls;
        self
    }
}

/// Collaborator that can be switched into an outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Resolver,
    DeviceMapping,
    IotHub,
    Network,
    Modules,
    Telemetry,
    Notifications,
    ActiveAlerts,
}

impl Service {
    fn label(self) -> &'static str {
        match self {
            Service::Resolver => "device resolver",
            Service::DeviceMapping => "device mapping",
            Service::IotHub => "iot hub",
            Service::Network => "network probe",
            Service::Modules => "module manager",
            Service::Telemetry => "telemetry monitor",
            Service::Notifications => "notification sink",
            Service::ActiveAlerts => "active alert store",
        }
    }
}

#[derive(Default)]
struct FleetState {
    restarts: HashMap<String, u32>,
    /// Polls per connector and run window start.
    telemetry_polls: HashMap<(String, DateTime<Utc>), u32>,
    active_alerts: HashMap<String, DateTime<Utc>>,
    channels_down: HashSet<String>,
    /// Channel and report, in delivery order.
    delivered: Vec<(String, FeedbackReport)>,
}

struct Fleet {
    gateways: Vec<SimulatedGateway>,
    channels: Vec<ChannelConfig>,
    outages: [AtomicBool; 8],
    state: Mutex<FleetState>,
}

/// Shared handle to the simulated fleet.
#[derive(Clone)]
pub struct InMemoryGateways {
    fleet: Arc<Fleet>,
}

impl Default for InMemoryGateways {
    fn default() -> Self {
        Self::new(Vec::new(), vec![ChannelConfig::new(DEFAULT_NOTIFICATION_CHANNEL)])
    }
}

impl std::fmt::Debug for InMemoryGateways {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels: Vec<&str> = self.fleet.channels.iter().map(|c| c.name.as_str()).collect();
        f.debug_struct("InMemoryGateways")
            .field("gateways", &self.fleet.gateways.len())
            .field("channels", &channels)
            .finish()
    }
}

impl InMemoryGateways {
    pub fn new(gateways: Vec<SimulatedGateway>, channels: Vec<ChannelConfig>) -> Self {
        Self {
            fleet: Arc::new(Fleet {
                gateways,
                channels,
                outages: Default::default(),
                state: Mutex::new(FleetState::default()),
            }),
        }
    }

    pub fn single(gateway: SimulatedGateway) -> Self {
        Self::new(vec![gateway], vec![ChannelConfig::new(DEFAULT_NOTIFICATION_CHANNEL)])
    }

    /// A healthy, online gateway for `connector_name` with no known addresses and no
    /// telemetry.
    pub fn gateway(connector_name: &str) -> SimulatedGateway {
        SimulatedGateway {
            connector_name: connector_name.to_string(),
            connector_id: format!("conn-{}", connector_name),
            device_name: format!("gw-{}", connector_name),
            iot_hub_name: "hub-sim".to_string(),
            online: true,
            addresses: Vec::new(),
            module_running: false,
            restart_fails: false,
            telemetry_resumes_after: None,
        }
    }

    pub fn set_outage(&self, service: Service, down: bool) {
        self.fleet.outages[service as usize].store(down, Ordering::SeqCst);
    }

    /// Makes delivery to one notification channel fail while the others keep working.
    pub async fn set_channel_outage(&self, channel: &str, down: bool) {
        let mut state = self.fleet.state.lock().await;
        if down {
            state.channels_down.insert(channel.to_string());
        } else {
            state.channels_down.remove(channel);
        }
    }

    /// Every collaborator the steps need, all backed by this fleet.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            iot_hub: Arc::new(self.clone()),
            network: Arc::new(self.clone()),
            modules: Arc::new(self.clone()),
            telemetry: Arc::new(self.clone()),
            notifications: self
                .fleet
                .channels
                .iter()
                .map(|config| {
                    Arc::new(InMemoryChannel {
                        gateways: self.clone(),
                        config: config.clone(),
                    }) as Arc<dyn NotificationSink>
                })
                .collect(),
            active_alerts: Arc::new(self.clone()),
        }
    }

    /// Accepted restarts per module.
    pub async fn restarts(&self, module: &str) -> u32 {
        self.fleet.state.lock().await.restarts.get(module).copied().unwrap_or(0)
    }

    /// Telemetry polls for `connector_id` across every run window.
    pub async fn telemetry_polls(&self, connector_id: &str) -> u32 {
        self.fleet
            .state
            .lock()
            .await
            .telemetry_polls
            .iter()
            .filter(|((id, _), _)| id == connector_id)
            .map(|(_, polls)| *polls)
            .sum()
    }

    /// Reports delivered to at least one channel, oldest first.
    pub async fn delivered(&self) -> Vec<FeedbackReport> {
        let state = self.fleet.state.lock().await;
        let mut reports: Vec<FeedbackReport> = Vec::new();
        for (_, report) in &state.delivered {
            if !reports.iter().any(|r| r.run_id == report.run_id) {
                reports.push(report.clone());
            }
        }
        reports
    }

    /// Reports delivered to `channel`, oldest first.
    pub async fn delivered_to(&self, channel: &str) -> Vec<FeedbackReport> {
        self.fleet
            .state
            .lock()
            .await
            .delivered
            .iter()
            .filter(|(name, _)| name == channel)
            .map(|(_, report)| report.clone())
            .collect()
    }

    fn check(&self, service: Service) -> Result<(), CollaboratorError> {
        if self.fleet.outages[service as usize].load(Ordering::SeqCst) {
            return Err(CollaboratorError::unavailable(service.label(), "simulated outage"));
        }
        Ok(())
    }

    fn by_connector_name(&self, connector_name: &str) -> Option<&SimulatedGateway> {
        self.fleet.gateways.iter().find(|g| g.connector_name == connector_name)
    }

    fn by_device(&self, iot_hub_name: &str, device_name: &str) -> Option<&SimulatedGateway> {
        self.fleet
            .gateways
            .iter()
            .find(|g| g.iot_hub_name == iot_hub_name && g.device_name == device_name)
    }
}

#[cfg(test)]
impl InMemoryGateways {
    /// Connection strings for every simulated hub.
    pub fn connection_strings(&self) -> HashMap<String, String> {
        self.fleet
            .gateways
            .iter()
            .map(|g| (g.iot_hub_name.clone(), format!("HostName={}.simulated", g.iot_hub_name)))
            .collect()
    }

    pub fn alert_for(&self, connector_name: &str) -> crate::domain::ConnectorAlert {
        let gateway = self.by_connector_name(connector_name).unwrap();
        crate::domain::ConnectorAlert {
            connector_id: gateway.connector_id.clone(),
            connector_name: gateway.connector_name.clone(),
            connector_type: "BACnet".to_string(),
            customer_id: "cust-test".to_string(),
        }
    }

    /// The request the consumer would build for `connector_name`.
    pub fn request_for(&self, connector_name: &str) -> crate::domain::ResolutionRequest {
        let gateway = self.by_connector_name(connector_name).unwrap();
        let device_info = gateway
            .addresses
            .iter()
            .map(|a| DeviceInfo {
                name: gateway.device_name.clone(),
                ip_address: a.ip,
            })
            .collect();
        crate::domain::ResolutionRequest::new(
            self.alert_for(connector_name),
            GatewayIdentity {
                device_name: gateway.device_name.clone(),
                iot_hub_name: gateway.iot_hub_name.clone(),
            },
            format!("HostName={}.simulated", gateway.iot_hub_name),
            device_info,
        )
    }
}

#[async_trait]
impl DeviceResolver for InMemoryGateways {
    async fn resolve_device_properties(
        &self,
        connector_name: &str,
    ) -> Result<Option<GatewayIdentity>, CollaboratorError> {
        self.check(Service::Resolver)?;
        Ok(self.by_connector_name(connector_name).map(|g| GatewayIdentity {
            device_name: g.device_name.clone(),
            iot_hub_name: g.iot_hub_name.clone(),
        }))
    }
}

#[async_trait]
impl DeviceMappingLookup for InMemoryGateways {
    async fn lookup_device_info(&self, device_name: &str) -> Result<Vec<DeviceInfo>, CollaboratorError> {
        self.check(Service::DeviceMapping)?;
        Ok(self
            .fleet
            .gateways
            .iter()
            .filter(|g| g.device_name == device_name)
            .flat_map(|g| {
                g.addresses.iter().map(move |a| DeviceInfo {
                    name: g.device_name.clone(),
                    ip_address: a.ip,
                })
            })
            .collect())
    }
}

#[async_trait]
impl IotHubClient for InMemoryGateways {
    async fn device_connection_state(
        &self,
        iot_hub_name: &str,
        connection_string: &str,
        device_name: &str,
    ) -> Result<ConnectionState, CollaboratorError> {
        self.check(Service::IotHub)?;
        if connection_string.is_empty() {
            return Err(CollaboratorError::rejected(Service::IotHub.label(), "empty connection string"));
        }
        let gateway = self.by_device(iot_hub_name, device_name).ok_or_else(|| {
            CollaboratorError::rejected(
                Service::IotHub.label(),
                format!("device '{}' is not registered on '{}'", device_name, iot_hub_name),
            )
        })?;

        Ok(if gateway.online {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        })
    }
}

#[async_trait]
impl NetworkProbe for InMemoryGateways {
    async fn is_reachable(&self, device: &DeviceInfo) -> Result<bool, CollaboratorError> {
        self.check(Service::Network)?;
        Ok(self
            .fleet
            .gateways
            .iter()
            .flat_map(|g| g.addresses.iter())
            .any(|a| a.ip == device.ip_address && a.reachable))
    }
}

#[async_trait]
impl ModuleManager for InMemoryGateways {
    async fn restart_module(
        &self,
        iot_hub_name: &str,
        _connection_string: &str,
        device_name: &str,
        module_name: &str,
    ) -> Result<RestartResponse, CollaboratorError> {
        self.check(Service::Modules)?;
        let gateway = self.by_device(iot_hub_name, device_name).ok_or_else(|| {
            CollaboratorError::rejected(Service::Modules.label(), format!("unknown device '{}'", device_name))
        })?;

        if gateway.restart_fails {
            return Err(CollaboratorError::unavailable(
                Service::Modules.label(),
                format!("restart of module '{}' failed", module_name),
            ));
        }
        if gateway.module_running {
            return Ok(RestartResponse::AlreadyRunning);
        }

        let mut state = self.fleet.state.lock().await;
        *state.restarts.entry(module_name.to_string()).or_insert(0) += 1;
        Ok(RestartResponse::Accepted)
    }
}

#[async_trait]
impl TelemetryMonitor for InMemoryGateways {
    async fn telemetry_resumed(&self, connector_id: &str, since: DateTime<Utc>) -> Result<bool, CollaboratorError> {
        self.check(Service::Telemetry)?;

        let mut state = self.fleet.state.lock().await;
        let polls = state
            .telemetry_polls
            .entry((connector_id.to_string(), since))
            .or_insert(0);
        *polls += 1;

        let resumes_after = self
            .fleet
            .gateways
            .iter()
            .find(|g| g.connector_id == connector_id)
            .and_then(|g| g.telemetry_resumes_after);
        Ok(matches!(resumes_after, Some(after) if *polls > after))
    }
}

#[async_trait]
impl ActiveAlertStore for InMemoryGateways {
    async fn last_raised(&self, key: &str) -> Result<Option<DateTime<Utc>>, CollaboratorError> {
        self.check(Service::ActiveAlerts)?;
        Ok(self.fleet.state.lock().await.active_alerts.get(key).copied())
    }

    async fn record_raised(&self, key: &str, at: DateTime<Utc>) -> Result<(), CollaboratorError> {
        self.check(Service::ActiveAlerts)?;
        self.fleet.state.lock().await.active_alerts.insert(key.to_string(), at);
        Ok(())
    }
}

/// One configured notification channel of the fleet.
struct InMemoryChannel {
    gateways: InMemoryGateways,
    config: ChannelConfig,
}

#[async_trait]
impl NotificationSink for InMemoryChannel {
    fn channel(&self) -> &str {
        &self.config.name
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn active_alert_ttl(&self) -> Duration {
        self.config.active_alert_ttl()
    }

    async fn deliver(&self, report: &FeedbackReport) -> Result<(), CollaboratorError> {
        self.gateways.check(Service::Notifications)?;
        let mut state = self.gateways.fleet.state.lock().await;
        if state.channels_down.contains(&self.config.name) {
            return Err(CollaboratorError::unavailable(
                Service::Notifications.label(),
                format!("channel '{}' is down", self.config.name),
            ));
        }
        state.delivered.push((self.config.name.clone(), report.clone()));
        Ok(())
    }
}
