// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::time::Duration;

/// Decision a step hands back to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Proceed with the next step in the chain.
    Continue,
    /// Diagnosis concluded; skip the rest of the chain.
    Stop,
    /// The step could not do its job; skip the rest of the chain.
    Fail,
}

impl Display for StepStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Continue => write!(f, "continue"),
            StepStatus::Stop => write!(f, "stop"),
            StepStatus::Fail => write!(f, "fail"),
        }
    }
}

/// What a step found. Each variant belongs to exactly one step so later steps and the
/// report can match on it instead of parsing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    DeviceOnline,
    DeviceOffline,
    NetworkReachable { probed: usize },
    NetworkUnreachable { unreachable: Vec<IpAddr> },
    /// The request carried no reachability facts, nothing was probed.
    NetworkNotProbed,
    RestartIssued { module: String },
    ModuleAlreadyRunning { module: String },
    TelemetryResumed,
    TelemetryAbsent { waited: Duration },
    /// Channels the report went to, was held back from as an already active alert, or
    /// failed on.
    FeedbackSent {
        delivered: Vec<String>,
        suppressed: Vec<String>,
        failed: Vec<String>,
    },
    /// The step could not complete; carries the rendered error.
    Error { message: String },
    /// The step gave up because the run was cancelled.
    Interrupted,
}

impl Display for Finding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::DeviceOnline => write!(f, "device online"),
            Finding::DeviceOffline => write!(f, "device offline"),
            Finding::NetworkReachable { probed } => {
                write!(f, "network reachable ({} address(es) probed)", probed)
            }
            Finding::NetworkUnreachable { unreachable } => {
                let addresses: Vec<String> = unreachable.iter().map(|ip| ip.to_string()).collect();
                write!(f, "network unreachable: {}", addresses.join(", "))
            }
            Finding::NetworkNotProbed => write!(f, "no device addresses known, network not probed"),
            Finding::RestartIssued { module } => write!(f, "restart issued for module '{}'", module),
            Finding::ModuleAlreadyRunning { module } => {
                write!(f, "module '{}' already running", module)
            }
            Finding::TelemetryResumed => write!(f, "resolved: telemetry resumed"),
            Finding::TelemetryAbsent { waited } => {
                write!(f, "unresolved: no telemetry after {:?}", waited)
            }
            Finding::FeedbackSent {
                delivered,
                suppressed,
                failed,
            } => {
                if delivered.is_empty() && suppressed.is_empty() && failed.is_empty() {
                    return write!(f, "no notification channel enabled");
                }
                let mut parts = Vec::new();
                if !delivered.is_empty() {
                    parts.push(format!("feedback sent to {}", quoted(delivered)));
                }
                if !suppressed.is_empty() {
                    parts.push(format!("already active on {}", quoted(suppressed)));
                }
                if !failed.is_empty() {
                    parts.push(format!("delivery failed on {}", quoted(failed)));
                }
                write!(f, "{}", parts.join("; "))
            }
            Finding::Error { message } => write!(f, "error: {}", message),
            Finding::Interrupted => write!(f, "interrupted by cancellation"),
        }
    }
}

fn quoted(channels: &[String]) -> String {
    channels.iter().map(|c| format!("'{}'", c)).collect::<Vec<_>>().join(", ")
}

/// Remediation performed by a step, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemediationAction {
    RestartModule { module: String },
}

impl Display for RemediationAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RemediationAction::RestartModule { module } => write!(f, "restarted module '{}'", module),
        }
    }
}

/// Result of one step invocation.
///
/// # Example
/// ```
/// use connector_remediation::domain::{Finding, StepOutcome, StepStatus};
///
/// let outcome = StepOutcome::stop(Finding::DeviceOffline);
/// assert_eq!(outcome.status, StepStatus::Stop);
/// assert_eq!(outcome.finding.to_string(), "device offline");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub status: StepStatus,
    pub finding: Finding,
    pub action: Option<RemediationAction>,
}

impl StepOutcome {
    pub fn proceed(finding: Finding) -> Self {
        Self {
            status: StepStatus::Continue,
            finding,
            action: None,
        }
    }

    pub fn stop(finding: Finding) -> Self {
        Self {
            status: StepStatus::Stop,
            finding,
            action: None,
        }
    }

    pub fn fail(finding: Finding) -> Self {
        Self {
            status: StepStatus::Fail,
            finding,
            action: None,
        }
    }

    pub fn with_action(mut self, action: RemediationAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Whether the runner halts the chain after this outcome.
    pub fn halts(&self) -> bool {
        self.status != StepStatus::Continue
    }
}
