// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use uuid::Uuid;

use crate::domain::{
    Finding, RemediationAction, ResolutionContext, ResolutionRequest, StepStatus, Termination,
};

/// Conclusion of a run, derived from how the chain ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Telemetry resumed after this run restarted the edge module.
    ResolvedByRestart,
    /// Telemetry resumed without a restart being issued.
    Resolved,
    /// Telemetry did not come back, whether or not this run restarted the module.
    Unresolved { restarted: bool },
    DeviceOffline,
    NetworkUnreachable { addresses: Vec<IpAddr> },
    /// A step could not do its job; nothing can be concluded about the connector.
    DiagnosisFailed { step: String, reason: String },
    Cancelled { step: String },
    /// A step concluded with a finding that has no dedicated verdict.
    Stopped { step: String, finding: String },
    /// The chain ran out of steps without concluding.
    Inconclusive,
}

impl Verdict {
    fn from_context(context: &ResolutionContext) -> Self {
        match context.termination() {
            Some(Termination::Stopped { step, finding }) => match finding {
                Finding::TelemetryResumed if context.actions().next().is_some() => Verdict::ResolvedByRestart,
                Finding::TelemetryResumed => Verdict::Resolved,
                Finding::DeviceOffline => Verdict::DeviceOffline,
                Finding::NetworkUnreachable { unreachable } => Verdict::NetworkUnreachable {
                    addresses: unreachable.clone(),
                },
                other => Verdict::Stopped {
                    step: step.to_string(),
                    finding: other.to_string(),
                },
            },
            Some(Termination::Failed { step, reason }) => Verdict::DiagnosisFailed {
                step: step.to_string(),
                reason: reason.clone(),
            },
            Some(Termination::Cancelled { step }) => Verdict::Cancelled { step: step.to_string() },
            None if context.has_finding(|f| matches!(f, Finding::TelemetryAbsent { .. })) => Verdict::Unresolved {
                restarted: context.actions().next().is_some(),
            },
            None => Verdict::Inconclusive,
        }
    }

    /// Stable name of the verdict, used in alert keys.
    pub fn kind(&self) -> &'static str {
        match self {
            Verdict::ResolvedByRestart => "resolved_by_restart",
            Verdict::Resolved => "resolved",
            Verdict::Unresolved { .. } => "unresolved",
            Verdict::DeviceOffline => "device_offline",
            Verdict::NetworkUnreachable { .. } => "network_unreachable",
            Verdict::DiagnosisFailed { .. } => "diagnosis_failed",
            Verdict::Cancelled { .. } => "cancelled",
            Verdict::Stopped { .. } => "stopped",
            Verdict::Inconclusive => "inconclusive",
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::ResolvedByRestart => write!(f, "resolved: telemetry resumed after restarting the edge module"),
            Verdict::Resolved => write!(f, "resolved: telemetry resumed"),
            Verdict::Unresolved { restarted: true } => {
                write!(f, "unresolved: telemetry did not resume after restart")
            }
            Verdict::Unresolved { restarted: false } => {
                write!(f, "unresolved: telemetry did not resume and the module was already running")
            }
            Verdict::DeviceOffline => write!(f, "device offline: gateway is not connected to its IoT hub"),
            Verdict::NetworkUnreachable { addresses } => {
                let addresses: Vec<String> = addresses.iter().map(|ip| ip.to_string()).collect();
                write!(f, "network unreachable: {}", addresses.join(", "))
            }
            Verdict::DiagnosisFailed { step, reason } => {
                write!(f, "diagnosis failed at {}: {}", step, reason)
            }
            Verdict::Cancelled { step } => write!(f, "cancelled before {} completed", step),
            Verdict::Stopped { step, finding } => write!(f, "stopped at {}: {}", step, finding),
            Verdict::Inconclusive => write!(f, "inconclusive: chain completed without a conclusion"),
        }
    }
}

/// One executed step as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSummary {
    pub step: &'static str,
    pub status: StepStatus,
    pub finding: String,
}

/// Operator-facing summary of one remediation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub customer_id: String,
    pub connector_id: String,
    pub connector_name: String,
    pub device_name: String,
    pub iot_hub_name: String,
    pub verdict: Verdict,
    pub steps: Vec<StepSummary>,
    pub actions: Vec<RemediationAction>,
}

impl FeedbackReport {
    pub fn from_context(request: &ResolutionRequest, context: &ResolutionContext) -> Self {
        Self {
            run_id: context.run_id(),
            started_at: context.started_at(),
            customer_id: request.customer_id().to_string(),
            connector_id: request.connector_id().to_string(),
            connector_name: request.connector_name().to_string(),
            device_name: request.device_name().to_string(),
            iot_hub_name: request.iot_hub_name().to_string(),
            verdict: Verdict::from_context(context),
            steps: context
                .records()
                .iter()
                .map(|r| StepSummary {
                    step: r.step,
                    status: r.status,
                    finding: r.finding.to_string(),
                })
                .collect(),
            actions: context.actions().cloned().collect(),
        }
    }

    /// Identifies the alert a report raises: the connector and the verdict kind. Reports
    /// with the same key count as the same alert on a channel.
    pub fn alert_key(&self) -> String {
        format!("{}:{}", self.connector_id, self.verdict.kind())
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.verdict, Verdict::ResolvedByRestart | Verdict::Resolved)
    }

    /// Whether a human needs to take over.
    pub fn escalation_recommended(&self) -> bool {
        matches!(self.verdict, Verdict::Unresolved { .. } | Verdict::DiagnosisFailed { .. })
    }
}

impl Display for FeedbackReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Connector '{}' ({}) of customer {} on gateway {} via {}",
            self.connector_name, self.connector_id, self.customer_id, self.device_name, self.iot_hub_name
        )?;
        writeln!(f, "Verdict: {}", self.verdict)?;
        if self.escalation_recommended() {
            writeln!(f, "Escalation recommended")?;
        }
        writeln!(f, "Steps:")?;
        for (position, summary) in self.steps.iter().enumerate() {
            writeln!(f, "  {}. {}: {} - {}", position + 1, summary.step, summary.status, summary.finding)?;
        }
        if !self.actions.is_empty() {
            let actions: Vec<String> = self.actions.iter().map(|a| a.to_string()).collect();
            writeln!(f, "Actions: {}", actions.join(", "))?;
        }
        Ok(())
    }
}
