// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{cancellable, FeedbackReport};
use crate::domain::{Finding, ResolutionContext, ResolutionRequest, StepOutcome};
use crate::errors::StepError;
use crate::observability::messages::notification::{
    ActiveAlertStoreUnavailable, FeedbackDelivered, FeedbackDeliveryFailed, FeedbackSuppressed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{ActiveAlertStore, NotificationSink, StepHandler};

/// Finalizer: summarizes the run for operators.
///
/// Registered with `finalize_with`, so it sees every chain record and the termination
/// reason however the chain ended.
///
/// The report goes to every enabled channel. A channel that fails does not keep the
/// report from the others, and the step only errors when no channel took it. A channel
/// that received the same alert (connector and verdict) within its active alert window
/// is skipped, so a redelivered alert does not page operators twice.
pub struct SendFeedback {
    sinks: Vec<Arc<dyn NotificationSink>>,
    active_alerts: Arc<dyn ActiveAlertStore>,
}

impl SendFeedback {
    pub const NAME: &'static str = "send_feedback";

    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>, active_alerts: Arc<dyn ActiveAlertStore>) -> Self {
        Self { sinks, active_alerts }
    }

    /// Whether `key` was raised within `ttl`. A store failure counts as not active.
    async fn is_active(&self, key: &str, ttl: Duration, cancel: &CancellationToken) -> Result<bool, StepError> {
        if ttl.is_zero() {
            return Ok(false);
        }

        match cancellable(cancel, self.active_alerts.last_raised(key)).await {
            Ok(Some(raised_at)) => Ok(Utc::now()
                .signed_duration_since(raised_at)
                .to_std()
                .map_or(true, |elapsed| elapsed <= ttl)),
            Ok(None) => Ok(false),
            Err(StepError::Collaborator(error)) => {
                ActiveAlertStoreUnavailable { key, error: &error }.log();
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    async fn remember(&self, key: &str) {
        if let Err(error) = self.active_alerts.record_raised(key, Utc::now()).await {
            ActiveAlertStoreUnavailable { key, error: &error }.log();
        }
    }
}

#[async_trait]
impl StepHandler<ResolutionRequest> for SendFeedback {
    async fn execute(
        &self,
        request: &ResolutionRequest,
        context: &ResolutionContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, StepError> {
        let report = FeedbackReport::from_context(request, context);
        let alert_key = report.alert_key();

        let mut delivered = Vec::new();
        let mut suppressed = Vec::new();
        let mut failed = Vec::new();
        let mut last_error = None;

        for sink in self.sinks.iter().filter(|sink| sink.is_enabled()) {
            let channel = sink.channel();
            let key = format!("{}:{}", alert_key, channel);

            if self.is_active(&key, sink.active_alert_ttl(), cancel).await? {
                FeedbackSuppressed {
                    channel,
                    alert_key: &alert_key,
                }
                .log();
                suppressed.push(channel.to_string());
                continue;
            }

            match cancellable(cancel, sink.deliver(&report)).await {
                Ok(()) => {
                    FeedbackDelivered {
                        channel,
                        alert_key: &alert_key,
                    }
                    .log();
                    self.remember(&key).await;
                    delivered.push(channel.to_string());
                }
                Err(StepError::Collaborator(error)) => {
                    FeedbackDeliveryFailed {
                        channel,
                        alert_key: &alert_key,
                        error: &error,
                    }
                    .log();
                    failed.push(channel.to_string());
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        if delivered.is_empty() && suppressed.is_empty() {
            if let Some(error) = last_error {
                return Err(error.into());
            }
        }

        Ok(StepOutcome::proceed(Finding::FeedbackSent {
            delivered,
            suppressed,
            failed,
        }))
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
