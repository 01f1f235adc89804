// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Connectivity remediation steps and the composition function that orders them.
//!
//! # Chain
//!
//! | # | Step | Concludes with |
//! |---|------|----------------|
//! | 0 | [`CheckDeviceStatus`] | `Stop` when the gateway is offline |
//! | 1 | [`CheckEdgeNetworkStatus`] | `Stop` when a gateway address is unreachable |
//! | 2 | [`RestartEdgeModule`] | never stops; an API error fails the run |
//! | 3 | [`VerifyTelemetryStatus`] | `Stop` once telemetry resumed |
//!
//! [`SendFeedback`] is registered as the finalizer and reports whatever the chain found to
//! every enabled notification channel.

mod check_device_status;
mod check_edge_network_status;
mod report;
mod restart_edge_module;
mod send_feedback;
mod verify_telemetry_status;

pub use check_device_status::CheckDeviceStatus;
pub use check_edge_network_status::CheckEdgeNetworkStatus;
pub use report::{FeedbackReport, StepSummary, Verdict};
pub use restart_edge_module::RestartEdgeModule;
pub use send_feedback::SendFeedback;
pub use verify_telemetry_status::VerifyTelemetryStatus;

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::consts::{DEFAULT_TELEMETRY_POLL_INTERVAL_SECS, DEFAULT_TELEMETRY_WAIT_SECS};
use crate::domain::ResolutionRequest;
use crate::engine::{Pipeline, PipelineRunner, RunnerOptions};
use crate::errors::{CollaboratorError, PipelineConfigError, StepError};
use crate::traits::Collaborators;

/// Tunables for the remediation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemediationSettings {
    pub runner: RunnerOptions,
    /// Upper bound on how long [`VerifyTelemetryStatus`] waits for telemetry.
    pub telemetry_wait: Duration,
    pub telemetry_poll_interval: Duration,
}

impl Default for RemediationSettings {
    fn default() -> Self {
        Self {
            runner: RunnerOptions::default(),
            telemetry_wait: Duration::from_secs(DEFAULT_TELEMETRY_WAIT_SECS),
            telemetry_poll_interval: Duration::from_secs(DEFAULT_TELEMETRY_POLL_INTERVAL_SECS),
        }
    }
}

/// Builds the connectivity remediation pipeline.
///
/// Ordering lives here and nowhere else.
pub fn remediation_pipeline(
    collaborators: &Collaborators,
    settings: &RemediationSettings,
) -> Result<PipelineRunner<ResolutionRequest>, PipelineConfigError> {
    Pipeline::configure::<ResolutionRequest>()
        .add_handler(CheckDeviceStatus::new(collaborators.iot_hub.clone()))
        .add_handler(CheckEdgeNetworkStatus::new(collaborators.network.clone()))
        .add_handler(RestartEdgeModule::new(collaborators.modules.clone()))
        .add_handler_with(|| {
            VerifyTelemetryStatus::new(
                collaborators.telemetry.clone(),
                settings.telemetry_wait,
                settings.telemetry_poll_interval,
            )
        })
        .finalize_with(SendFeedback::new(
            collaborators.notifications.clone(),
            collaborators.active_alerts.clone(),
        ))
        .with_options(settings.runner)
        .build()
}

/// Awaits a collaborator call unless the run is cancelled first.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, StepError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StepError::Cancelled),
        result = call => Ok(result?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_memory::InMemoryGateways;
    use crate::engine::StepRole;

    #[test]
    fn test_remediation_pipeline_order() {
        let gateways = InMemoryGateways::default();
        let runner = remediation_pipeline(&gateways.collaborators(), &RemediationSettings::default()).unwrap();

        let names: Vec<&str> = runner.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                CheckDeviceStatus::NAME,
                CheckEdgeNetworkStatus::NAME,
                RestartEdgeModule::NAME,
                VerifyTelemetryStatus::NAME,
                SendFeedback::NAME,
            ]
        );
        assert_eq!(runner.descriptors()[4].role, StepRole::Finalizer);
    }

    #[tokio::test]
    async fn test_cancellable_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = cancellable(&cancel, async { Ok::<_, CollaboratorError>(true) }).await;
        assert!(matches!(result, Err(StepError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellable_maps_collaborator_error() {
        let result: Result<bool, StepError> = cancellable(&CancellationToken::new(), async {
            Err(CollaboratorError::unavailable("iot hub", "503"))
        })
        .await;
        assert!(matches!(result, Err(StepError::Collaborator(_))));
    }
}
