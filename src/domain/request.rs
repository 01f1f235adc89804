// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Inbound alert message as published on the connectivity-alert topic.
///
/// # Example
/// ```
/// use connector_remediation::domain::ConnectorAlert;
///
/// let alert: ConnectorAlert = serde_json::from_str(r#"{
///     "ConnectorId": "c-17",
///     "ConnectorName": "bms-north",
///     "ConnectorType": "BACnet",
///     "CustomerId": "cust-3"
/// }"#).unwrap();
///
/// assert_eq!(alert.connector_name, "bms-north");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectorAlert {
    pub connector_id: String,
    pub connector_name: String,
    pub connector_type: String,
    pub customer_id: String,
}

/// Gateway identity resolved for a connector before any run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayIdentity {
    pub device_name: String,
    pub iot_hub_name: String,
}

/// One reachability fact about the gateway, as returned by the device mapping lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub ip_address: IpAddr,
}

/// Immutable facts about one alert occurrence.
///
/// A request can only be built from a resolved [`GatewayIdentity`], so an unresolved
/// connector never reaches the pipeline. There are no setters: the runner and every
/// step only ever see `&ResolutionRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionRequest {
    customer_id: String,
    connector_id: String,
    connector_name: String,
    connector_type: String,
    iot_hub_connection_string: String,
    iot_hub_name: String,
    device_name: String,
    device_info: Vec<DeviceInfo>,
}

impl ResolutionRequest {
    pub fn new(
        alert: ConnectorAlert,
        identity: GatewayIdentity,
        iot_hub_connection_string: impl Into<String>,
        device_info: Vec<DeviceInfo>,
    ) -> Self {
        Self {
            customer_id: alert.customer_id,
            connector_id: alert.connector_id,
            connector_name: alert.connector_name,
            connector_type: alert.connector_type,
            iot_hub_connection_string: iot_hub_connection_string.into(),
            iot_hub_name: identity.iot_hub_name,
            device_name: identity.device_name,
            device_info,
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn connector_id(&self) -> &str {
        &self.connector_id
    }

    pub fn connector_name(&self) -> &str {
        &self.connector_name
    }

    pub fn connector_type(&self) -> &str {
        &self.connector_type
    }

    pub fn iot_hub_connection_string(&self) -> &str {
        &self.iot_hub_connection_string
    }

    pub fn iot_hub_name(&self) -> &str {
        &self.iot_hub_name
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn device_info(&self) -> &[DeviceInfo] {
        &self.device_info
    }

    /// Edge module hosting the connector. Connectors are deployed as a module named
    /// after the connector itself.
    pub fn edge_module_name(&self) -> &str {
        &self.connector_name
    }
}
