// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for step invocation events.

use crate::domain::{Finding, StepStatus};
use crate::engine::StepRole;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Step invocation started.
///
/// # Log Level
/// `debug!` - Per-step detail
pub struct StepStarted<'a> {
    pub step: &'a str,
    pub ordinal: usize,
    pub role: StepRole,
}

impl Display for StepStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step {} '{}' ({}) started", self.ordinal, self.step, self.role)
    }
}

impl StructuredLog for StepStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            step = self.step,
            ordinal = self.ordinal,
            role = %self.role,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step",
            span_name = name,
            step = self.step,
            ordinal = self.ordinal,
            role = %self.role,
        )
    }
}

/// Step returned an outcome.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use connector_remediation::domain::{Finding, StepStatus};
/// use connector_remediation::observability::messages::step::StepCompleted;
/// use std::time::Duration;
///
/// let finding = Finding::DeviceOffline;
/// let msg = StepCompleted {
///     step: "check_device_status",
///     ordinal: 0,
///     status: StepStatus::Stop,
///     finding: &finding,
///     duration: Duration::from_millis(12),
/// };
///
/// assert!(msg.to_string().contains("stop - device offline"));
/// ```
pub struct StepCompleted<'a> {
    pub step: &'a str,
    pub ordinal: usize,
    pub status: StepStatus,
    pub finding: &'a Finding,
    pub duration: Duration,
}

impl Display for StepCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step {} '{}' completed: {} - {} ({:?})",
            self.ordinal, self.step, self.status, self.finding, self.duration
        )
    }
}

impl StructuredLog for StepCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            step = self.step,
            ordinal = self.ordinal,
            status = %self.status,
            finding = %self.finding,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step_completed",
            span_name = name,
            step = self.step,
            ordinal = self.ordinal,
            status = %self.status,
        )
    }
}

/// Step could not complete (error, timeout or panic).
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use connector_remediation::observability::messages::step::StepFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "module API returned 503");
/// let msg = StepFailed {
///     step: "restart_edge_module",
///     ordinal: 2,
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct StepFailed<'a> {
    pub step: &'a str,
    pub ordinal: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for StepFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step {} '{}' failed: {}", self.ordinal, self.step, self.error)
    }
}

impl StructuredLog for StepFailed<'_> {
    fn log(&self) {
        tracing::error!(
            step = self.step,
            ordinal = self.ordinal,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "step_failed",
            span_name = name,
            step = self.step,
            ordinal = self.ordinal,
            error = %self.error,
        )
    }
}

/// Step not invoked because the chain already halted.
pub struct StepSkipped<'a> {
    pub step: &'a str,
    pub ordinal: usize,
    pub halted_by: &'a str,
}

impl Display for StepSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step {} '{}' skipped, chain halted by '{}'",
            self.ordinal, self.step, self.halted_by
        )
    }
}

impl StructuredLog for StepSkipped<'_> {
    fn log(&self) {
        tracing::debug!(
            step = self.step,
            ordinal = self.ordinal,
            halted_by = self.halted_by,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "step_skipped",
            span_name = name,
            step = self.step,
            ordinal = self.ordinal,
        )
    }
}
