// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::cancellable;
use crate::domain::{Finding, ResolutionContext, ResolutionRequest, StepOutcome};
use crate::errors::StepError;
use crate::traits::{NetworkProbe, StepHandler};

/// Probes every known gateway address.
///
/// Requests without device info pass through unprobed; a missing mapping is not
/// evidence of a network fault.
pub struct CheckEdgeNetworkStatus {
    network: Arc<dyn NetworkProbe>,
}

impl CheckEdgeNetworkStatus {
    pub const NAME: &'static str = "check_edge_network_status";

    pub fn new(network: Arc<dyn NetworkProbe>) -> Self {
        Self { network }
    }
}

#[async_trait]
impl StepHandler<ResolutionRequest> for CheckEdgeNetworkStatus {
    async fn execute(
        &self,
        request: &ResolutionRequest,
        _context: &ResolutionContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, StepError> {
        let devices = request.device_info();
        if devices.is_empty() {
            return Ok(StepOutcome::proceed(Finding::NetworkNotProbed));
        }

        let mut unreachable = Vec::new();
        for device in devices {
            if !cancellable(cancel, self.network.is_reachable(device)).await? {
                unreachable.push(device.ip_address);
            }
        }

        if unreachable.is_empty() {
            Ok(StepOutcome::proceed(Finding::NetworkReachable {
                probed: devices.len(),
            }))
        } else {
            Ok(StepOutcome::stop(Finding::NetworkUnreachable { unreachable }))
        }
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
