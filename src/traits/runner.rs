// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::ResolutionContext;

/// Entry point the alert consumer drives, one call per alert.
///
/// Implementations contain every step-level failure; returning means the run is over.
/// The decision outcome is in `context` and in the logs, never in the return value.
#[async_trait]
pub trait ResolutionStepRunner<R: Send + Sync>: Send + Sync {
    async fn run(&self, request: &R, context: &mut ResolutionContext, cancel: &CancellationToken);
}
