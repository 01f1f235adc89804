// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::cancellable;
use crate::domain::{Finding, ResolutionContext, ResolutionRequest, StepOutcome};
use crate::errors::StepError;
use crate::traits::{StepHandler, TelemetryMonitor};

/// Waits a bounded time for the connector's telemetry to come back.
///
/// Telemetry counts when it arrived after the run started. The wait has to stay below
/// the runner's step timeout or the step is cut off before it can conclude.
pub struct VerifyTelemetryStatus {
    telemetry: Arc<dyn TelemetryMonitor>,
    wait: Duration,
    poll_interval: Duration,
}

impl VerifyTelemetryStatus {
    pub const NAME: &'static str = "verify_telemetry_status";

    pub fn new(telemetry: Arc<dyn TelemetryMonitor>, wait: Duration, poll_interval: Duration) -> Self {
        Self {
            telemetry,
            wait,
            poll_interval,
        }
    }
}

#[async_trait]
impl StepHandler<ResolutionRequest> for VerifyTelemetryStatus {
    async fn execute(
        &self,
        request: &ResolutionRequest,
        context: &ResolutionContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, StepError> {
        let since = context.started_at();
        let deadline = Instant::now() + self.wait;

        loop {
            let resumed = cancellable(
                cancel,
                self.telemetry.telemetry_resumed(request.connector_id(), since),
            )
            .await?;
            if resumed {
                return Ok(StepOutcome::stop(Finding::TelemetryResumed));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(StepOutcome::proceed(Finding::TelemetryAbsent { waited: self.wait }));
            }

            let pause = self.poll_interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StepError::Cancelled),
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
