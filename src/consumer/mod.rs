// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Alert intake: decodes an inbound alert, resolves the gateway it concerns and starts
//! exactly one pipeline run for it.
//!
//! Transport concerns (queue client, lock renewal, redelivery) stay outside; the
//! caller hands in the raw payload and a token tied to the processing attempt. An
//! `Ok(Disposition)` is acknowledged, an `Err` leaves the message for redelivery.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::consts::DEFAULT_LOOKUP_TIMEOUT_SECS;
use crate::domain::{ConnectorAlert, ResolutionContext, ResolutionRequest};
use crate::errors::{CollaboratorError, ConsumerError};
use crate::observability::messages::consumer::{
    AlertAcknowledged, AlertReceived, DeviceMappingUnavailable, MalformedAlert, ResolutionMiss,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{DeviceMappingLookup, DeviceResolver, ResolutionStepRunner};

/// What happened to one alert message. Every disposition is final and acknowledged;
/// redelivering a miss or a malformed payload cannot change the result.
#[derive(Debug, Clone)]
pub enum Disposition {
    /// A run executed; its full record is attached.
    Completed { context: ResolutionContext },
    /// The connector could not be tied to a gateway. No run was started.
    ResolutionMiss { connector_name: String, reason: String },
    /// The payload was not a valid alert.
    Rejected { reason: String },
}

impl Disposition {
    pub fn context(&self) -> Option<&ResolutionContext> {
        match self {
            Disposition::Completed { context } => Some(context),
            _ => None,
        }
    }
}

impl Display for Disposition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposition::Completed { context } => match context.termination() {
                Some(termination) => write!(f, "completed, {}", termination),
                None => write!(f, "completed, chain ran to the end"),
            },
            Disposition::ResolutionMiss { connector_name, reason } => {
                write!(f, "resolution miss for '{}': {}", connector_name, reason)
            }
            Disposition::Rejected { reason } => write!(f, "rejected: {}", reason),
        }
    }
}

/// Turns alert messages into pipeline runs.
pub struct AlertConsumer {
    resolver: Arc<dyn DeviceResolver>,
    mappings: Arc<dyn DeviceMappingLookup>,
    runner: Arc<dyn ResolutionStepRunner<ResolutionRequest>>,
    connection_strings: HashMap<String, String>,
    lookup_timeout: Duration,
}

impl AlertConsumer {
    /// `connection_strings` maps IoT hub names to their service connection strings.
    pub fn new(
        resolver: Arc<dyn DeviceResolver>,
        mappings: Arc<dyn DeviceMappingLookup>,
        runner: Arc<dyn ResolutionStepRunner<ResolutionRequest>>,
        connection_strings: HashMap<String, String>,
    ) -> Self {
        Self {
            resolver,
            mappings,
            runner,
            connection_strings,
            lookup_timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
        }
    }

    /// Bounds each resolver and device mapping call made before the run starts.
    pub fn with_lookup_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    /// Decodes a raw JSON payload and handles it.
    pub async fn handle_payload(
        &self,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Disposition, ConsumerError> {
        match serde_json::from_slice::<ConnectorAlert>(payload) {
            Ok(alert) => self.handle(alert, cancel).await,
            Err(error) => {
                MalformedAlert {
                    payload_size: payload.len(),
                    error: &error,
                }
                .log();
                let disposition = Disposition::Rejected {
                    reason: error.to_string(),
                };
                AlertAcknowledged {
                    connector_id: "unknown",
                    disposition: &disposition.to_string(),
                }
                .log();
                Ok(disposition)
            }
        }
    }

    /// Resolves the gateway for `alert` and runs the pipeline once.
    ///
    /// Returns `Err` when resolution failed for infrastructure reasons or the attempt was
    /// cancelled before a run started; the message should then be left for redelivery.
    pub async fn handle(
        &self,
        alert: ConnectorAlert,
        cancel: &CancellationToken,
    ) -> Result<Disposition, ConsumerError> {
        let span = AlertReceived {
            connector_id: &alert.connector_id,
            connector_name: &alert.connector_name,
            customer_id: &alert.customer_id,
        }
        .span("handle_alert");

        self.process(alert, cancel).instrument(span).await
    }

    async fn process(
        &self,
        alert: ConnectorAlert,
        cancel: &CancellationToken,
    ) -> Result<Disposition, ConsumerError> {
        AlertReceived {
            connector_id: &alert.connector_id,
            connector_name: &alert.connector_name,
            customer_id: &alert.customer_id,
        }
        .log();

        let resolution = self
            .lookup(cancel, "device resolver", self.resolver.resolve_device_properties(&alert.connector_name))
            .await?;
        let identity = match resolution {
            Ok(Some(identity)) => identity,
            Ok(None) => return Ok(self.miss(&alert, "no gateway registered for connector")),
            Err(source) => {
                return Err(ConsumerError::Resolution {
                    connector_name: alert.connector_name,
                    source,
                })
            }
        };

        let Some(connection_string) = self.connection_strings.get(&identity.iot_hub_name) else {
            let reason = format!("no connection string configured for IoT hub '{}'", identity.iot_hub_name);
            return Ok(self.miss(&alert, &reason));
        };

        let mapping = self
            .lookup(cancel, "device mapping", self.mappings.lookup_device_info(&identity.device_name))
            .await?;
        let device_info = match mapping {
            Ok(device_info) => device_info,
            Err(error) => {
                DeviceMappingUnavailable {
                    device_name: &identity.device_name,
                    error: &error,
                }
                .log();
                Vec::new()
            }
        };

        let connector_id = alert.connector_id.clone();
        let request = ResolutionRequest::new(alert, identity, connection_string.clone(), device_info);
        let mut context = ResolutionContext::new();
        self.runner.run(&request, &mut context, cancel).await;

        let disposition = Disposition::Completed { context };
        AlertAcknowledged {
            connector_id: &connector_id,
            disposition: &disposition.to_string(),
        }
        .log();
        Ok(disposition)
    }

    /// Awaits a pre-run lookup unless the attempt is cancelled first. A lookup that
    /// outlives `lookup_timeout` counts as the service being unavailable.
    async fn lookup<T, F>(
        &self,
        cancel: &CancellationToken,
        service: &'static str,
        call: F,
    ) -> Result<Result<T, CollaboratorError>, ConsumerError>
    where
        F: Future<Output = Result<T, CollaboratorError>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ConsumerError::Cancelled),
            result = tokio::time::timeout(self.lookup_timeout, call) => Ok(result.unwrap_or_else(|_| {
                Err(CollaboratorError::unavailable(
                    service,
                    format!("no answer within {:?}", self.lookup_timeout),
                ))
            })),
        }
    }

    fn miss(&self, alert: &ConnectorAlert, reason: &str) -> Disposition {
        ResolutionMiss {
            connector_name: &alert.connector_name,
            reason,
        }
        .log();
        let disposition = Disposition::ResolutionMiss {
            connector_name: alert.connector_name.clone(),
            reason: reason.to_string(),
        };
        AlertAcknowledged {
            connector_id: &alert.connector_id,
            disposition: &disposition.to_string(),
        }
        .log();
        disposition
    }
}
