// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::backends::in_memory::InMemoryGateways;
use crate::config::Config;
use crate::consumer::AlertConsumer;
use crate::errors::ConfigError;
use crate::steps::remediation_pipeline;
use crate::traits::{Collaborators, DeviceMappingLookup, DeviceResolver};

/// Remediation runtime builder - wires the pipeline and the alert consumer from configuration.
///
/// # Examples
///
/// ```
/// use connector_remediation::config::{Config, RuntimeBuilder};
///
/// let config = Config::default();
/// let (_consumer, gateways) = RuntimeBuilder::simulated(&config).unwrap();
///
/// assert_eq!(format!("{:?}", gateways), "InMemoryGateways { gateways: 0, channels: [\"connectivity-ops\"] }");
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Builds the remediation pipeline over `collaborators` and an alert consumer in
    /// front of it.
    pub fn from_config(
        cfg: &Config,
        resolver: Arc<dyn DeviceResolver>,
        mappings: Arc<dyn DeviceMappingLookup>,
        collaborators: &Collaborators,
    ) -> Result<AlertConsumer, ConfigError> {
        let runner = remediation_pipeline(collaborators, &cfg.remediation_settings())?;

        Ok(AlertConsumer::new(
            resolver,
            mappings,
            Arc::new(runner),
            cfg.consumer.iot_hub_connection_strings.clone(),
        )
        .with_lookup_timeout(cfg.lookup_timeout()))
    }

    /// Same as [`RuntimeBuilder::from_config`], with every collaborator backed by the
    /// configured simulation. The fleet handle is returned for inspection.
    pub fn simulated(cfg: &Config) -> Result<(AlertConsumer, InMemoryGateways), ConfigError> {
        let gateways = InMemoryGateways::new(cfg.simulation.gateways.clone(), cfg.notification.channels.clone());
        let consumer = Self::from_config(
            cfg,
            Arc::new(gateways.clone()),
            Arc::new(gateways.clone()),
            &gateways.collaborators(),
        )?;
        Ok((consumer, gateways))
    }
}
