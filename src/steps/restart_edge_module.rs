// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::cancellable;
use crate::domain::{Finding, RemediationAction, ResolutionContext, ResolutionRequest, StepOutcome};
use crate::errors::StepError;
use crate::traits::{ModuleManager, RestartResponse, StepHandler};

/// Restarts the edge module hosting the connector.
///
/// Safe to repeat on redelivery: restarting a healthy module only costs the restart.
pub struct RestartEdgeModule {
    modules: Arc<dyn ModuleManager>,
}

impl RestartEdgeModule {
    pub const NAME: &'static str = "restart_edge_module";

    pub fn new(modules: Arc<dyn ModuleManager>) -> Self {
        Self { modules }
    }
}

#[async_trait]
impl StepHandler<ResolutionRequest> for RestartEdgeModule {
    async fn execute(
        &self,
        request: &ResolutionRequest,
        _context: &ResolutionContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, StepError> {
        let module = request.edge_module_name().to_string();
        let response = cancellable(
            cancel,
            self.modules.restart_module(
                request.iot_hub_name(),
                request.iot_hub_connection_string(),
                request.device_name(),
                &module,
            ),
        )
        .await?;

        Ok(match response {
            RestartResponse::Accepted => StepOutcome::proceed(Finding::RestartIssued {
                module: module.clone(),
            })
            .with_action(RemediationAction::RestartModule { module }),
            RestartResponse::AlreadyRunning => StepOutcome::proceed(Finding::ModuleAlreadyRunning { module }),
        })
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_memory::InMemoryGateways;
    use crate::domain::StepStatus;

    #[tokio::test]
    async fn test_restart_is_issued_and_recorded_as_action() {
        let gateways = InMemoryGateways::single(InMemoryGateways::gateway("bms-north"));
        let step = RestartEdgeModule::new(Arc::new(gateways.clone()));

        let outcome = step
            .execute(
                &gateways.request_for("bms-north"),
                &ResolutionContext::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, StepStatus::Continue);
        assert_eq!(
            outcome.action,
            Some(RemediationAction::RestartModule {
                module: "bms-north".to_string()
            })
        );
        assert_eq!(gateways.restarts("bms-north").await, 1);
    }

    #[tokio::test]
    async fn test_already_running_module_is_not_an_action() {
        let gateways = InMemoryGateways::single(InMemoryGateways::gateway("bms-north").module_running(true));
        let step = RestartEdgeModule::new(Arc::new(gateways.clone()));

        let outcome = step
            .execute(
                &gateways.request_for("bms-north"),
                &ResolutionContext::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome.finding,
            Finding::ModuleAlreadyRunning {
                module: "bms-north".to_string()
            }
        );
        assert!(outcome.action.is_none());
    }

    #[tokio::test]
    async fn test_restart_rejection_is_an_error() {
        let gateways = InMemoryGateways::single(InMemoryGateways::gateway("bms-north").restart_fails(true));
        let step = RestartEdgeModule::new(Arc::new(gateways.clone()));

        let result = step
            .execute(
                &gateways.request_for("bms-north"),
                &ResolutionContext::new(),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(StepError::Collaborator(_))));
    }
}
