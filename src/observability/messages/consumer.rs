// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for alert intake events.
//!
//! This module contains message types for logging events related to:
//! * Alert reception and decoding
//! * Device and hub identity resolution
//! * Message acknowledgement

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Alert received and decoded.
///
/// # Log Level
/// `info!` - Important operational event
pub struct AlertReceived<'a> {
    pub connector_id: &'a str,
    pub connector_name: &'a str,
    pub customer_id: &'a str,
}

impl Display for AlertReceived<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Connectivity alert for connector '{}' ({}) of customer {}",
            self.connector_name, self.connector_id, self.customer_id
        )
    }
}

impl StructuredLog for AlertReceived<'_> {
    fn log(&self) {
        tracing::info!(
            connector_id = self.connector_id,
            connector_name = self.connector_name,
            customer_id = self.customer_id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "alert",
            span_name = name,
            connector_id = self.connector_id,
            connector_name = self.connector_name,
            customer_id = self.customer_id,
        )
    }
}

/// Payload could not be decoded as an alert; it is acknowledged and dropped.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct MalformedAlert<'a> {
    pub payload_size: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for MalformedAlert<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropping malformed alert payload ({} bytes): {}",
            self.payload_size, self.error
        )
    }
}

impl StructuredLog for MalformedAlert<'_> {
    fn log(&self) {
        tracing::error!(
            payload_size = self.payload_size,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "malformed_alert",
            span_name = name,
            payload_size = self.payload_size,
        )
    }
}

/// Gateway identity could not be resolved; no run is started.
///
/// # Log Level
/// `warn!` - Expected, non-retryable
///
/// # Example
/// ```
/// use connector_remediation::observability::messages::consumer::ResolutionMiss;
///
/// let msg = ResolutionMiss {
///     connector_name: "bms-north",
///     reason: "no gateway registered for connector",
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Cannot resolve gateway for connector 'bms-north': no gateway registered for connector"
/// );
/// ```
pub struct ResolutionMiss<'a> {
    pub connector_name: &'a str,
    pub reason: &'a str,
}

impl Display for ResolutionMiss<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cannot resolve gateway for connector '{}': {}",
            self.connector_name, self.reason
        )
    }
}

impl StructuredLog for ResolutionMiss<'_> {
    fn log(&self) {
        tracing::warn!(
            connector_name = self.connector_name,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "resolution_miss",
            span_name = name,
            connector_name = self.connector_name,
        )
    }
}

/// Device mapping lookup failed; the run continues without reachability facts.
pub struct DeviceMappingUnavailable<'a> {
    pub device_name: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for DeviceMappingUnavailable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Device mapping for '{}' unavailable, continuing without addresses: {}",
            self.device_name, self.error
        )
    }
}

impl StructuredLog for DeviceMappingUnavailable<'_> {
    fn log(&self) {
        tracing::warn!(
            device_name = self.device_name,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "device_mapping_unavailable",
            span_name = name,
            device_name = self.device_name,
        )
    }
}

/// Message acknowledged to the transport.
///
/// # Log Level
/// `info!` - Important operational event
pub struct AlertAcknowledged<'a> {
    pub connector_id: &'a str,
    pub disposition: &'a str,
}

impl Display for AlertAcknowledged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Acknowledged alert for connector {}: {}",
            self.connector_id, self.disposition
        )
    }
}

impl StructuredLog for AlertAcknowledged<'_> {
    fn log(&self) {
        tracing::info!(
            connector_id = self.connector_id,
            disposition = self.disposition,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "alert_acknowledged",
            span_name = name,
            connector_id = self.connector_id,
        )
    }
}
