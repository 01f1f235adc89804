// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{ResolutionContext, StepOutcome};
use crate::errors::StepError;

/// One diagnostic or remediation action in a pipeline.
///
/// Contract every implementation honors:
/// * expected negative findings (device offline, telemetry absent) are returned as a
///   `Stop` or `Continue` outcome, never as `Err`
/// * `Err` means the handler could not complete its check or action
/// * re-invoking with the same request is harmless, the whole pipeline re-runs when the
///   alert message is redelivered
/// * long external calls race against `cancel` or are bounded by a timeout
#[async_trait]
pub trait StepHandler<R: Send + Sync>: Send + Sync {
    async fn execute(
        &self,
        request: &R,
        context: &ResolutionContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, StepError>;

    /// Stable step name used as the record key in the context and in logs.
    fn name(&self) -> &'static str;
}
