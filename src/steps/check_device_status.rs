// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::cancellable;
use crate::domain::{Finding, ResolutionContext, ResolutionRequest, StepOutcome};
use crate::errors::StepError;
use crate::traits::{ConnectionState, IotHubClient, StepHandler};

/// Asks the IoT hub whether the gateway device is connected.
///
/// An offline gateway explains the alert on its own, so the chain stops there: nothing
/// further down can be checked or fixed remotely.
pub struct CheckDeviceStatus {
    iot_hub: Arc<dyn IotHubClient>,
}

impl CheckDeviceStatus {
    pub const NAME: &'static str = "check_device_status";

    pub fn new(iot_hub: Arc<dyn IotHubClient>) -> Self {
        Self { iot_hub }
    }
}

#[async_trait]
impl StepHandler<ResolutionRequest> for CheckDeviceStatus {
    async fn execute(
        &self,
        request: &ResolutionRequest,
        _context: &ResolutionContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, StepError> {
        let state = cancellable(
            cancel,
            self.iot_hub.device_connection_state(
                request.iot_hub_name(),
                request.iot_hub_connection_string(),
                request.device_name(),
            ),
        )
        .await?;

        Ok(match state {
            ConnectionState::Connected => StepOutcome::proceed(Finding::DeviceOnline),
            ConnectionState::Disconnected => StepOutcome::stop(Finding::DeviceOffline),
        })
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
