// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use uuid::Uuid;

use super::outcome::{Finding, RemediationAction, StepOutcome, StepStatus};
use crate::engine::StepRole;

/// One executed step, as recorded by the runner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub ordinal: usize,
    pub step: &'static str,
    pub role: StepRole,
    pub status: StepStatus,
    pub finding: Finding,
    pub action: Option<RemediationAction>,
    pub elapsed: Duration,
}

impl StepRecord {
    pub(crate) fn from_outcome(
        ordinal: usize,
        step: &'static str,
        role: StepRole,
        outcome: StepOutcome,
        elapsed: Duration,
    ) -> Self {
        Self {
            ordinal,
            step,
            role,
            status: outcome.status,
            finding: outcome.finding,
            action: outcome.action,
            elapsed,
        }
    }
}

/// Why the chain stopped before running every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// A step concluded the diagnosis.
    Stopped { step: &'static str, finding: Finding },
    /// A step failed or errored; the diagnosis machinery broke.
    Failed { step: &'static str, reason: String },
    /// The run was cancelled before (or while) `step` ran.
    Cancelled { step: &'static str },
}

impl Termination {
    pub fn step(&self) -> &'static str {
        match self {
            Termination::Stopped { step, .. }
            | Termination::Failed { step, .. }
            | Termination::Cancelled { step } => step,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Termination::Failed { .. })
    }
}

impl Display for Termination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Stopped { step, finding } => write!(f, "stopped at {}: {}", step, finding),
            Termination::Failed { step, reason } => write!(f, "failed at {}: {}", step, reason),
            Termination::Cancelled { step } => write!(f, "cancelled at {}", step),
        }
    }
}

/// Per-run record of every executed step.
///
/// A context is created fresh for each run and owned by it. Steps receive it by shared
/// reference and can only read; the runner is the only writer, and it only appends.
/// The termination reason is written once: the first halting step wins.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    records: Vec<StepRecord>,
    termination: Option<Termination>,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            records: Vec::new(),
            termination: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Records in execution order.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Names of the executed steps, in execution order.
    pub fn executed_steps(&self) -> Vec<&'static str> {
        self.records.iter().map(|r| r.step).collect()
    }

    /// Latest record for `step`. A handler registered twice has two records.
    pub fn outcome_of(&self, step: &str) -> Option<&StepRecord> {
        self.records.iter().rev().find(|r| r.step == step)
    }

    pub fn has_finding(&self, predicate: impl Fn(&Finding) -> bool) -> bool {
        self.records.iter().any(|r| predicate(&r.finding))
    }

    pub fn actions(&self) -> impl Iterator<Item = &RemediationAction> {
        self.records.iter().filter_map(|r| r.action.as_ref())
    }

    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    pub fn is_halted(&self) -> bool {
        self.termination.is_some()
    }

    pub(crate) fn append(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    /// Returns `false` when a termination was already recorded.
    pub(crate) fn terminate(&mut self, termination: Termination) -> bool {
        if self.termination.is_some() {
            return false;
        }
        self.termination = Some(termination);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(step: &'static str, finding: Finding) -> StepRecord {
        StepRecord::from_outcome(
            0,
            step,
            StepRole::Chain,
            StepOutcome::proceed(finding),
            Duration::ZERO,
        )
    }

    #[test]
    fn test_new_contexts_are_independent() {
        let a = ResolutionContext::new();
        let b = ResolutionContext::new();
        assert_ne!(a.run_id(), b.run_id());
        assert!(a.records().is_empty());
        assert!(a.termination().is_none());
    }

    #[test]
    fn test_first_termination_wins() {
        let mut context = ResolutionContext::new();
        assert!(context.terminate(Termination::Stopped {
            step: "check_device_status",
            finding: Finding::DeviceOffline,
        }));
        assert!(!context.terminate(Termination::Failed {
            step: "send_feedback",
            reason: "sink down".to_string(),
        }));

        assert_eq!(context.termination().map(|t| t.step()), Some("check_device_status"));
        assert!(!context.termination().unwrap().is_failure());
    }

    #[test]
    fn test_outcome_of_returns_latest_record() {
        let mut context = ResolutionContext::new();
        context.append(record("check_device_status", Finding::DeviceOffline));
        context.append(record("check_device_status", Finding::DeviceOnline));

        assert_eq!(context.executed_steps(), vec!["check_device_status", "check_device_status"]);
        assert_eq!(
            context.outcome_of("check_device_status").map(|r| &r.finding),
            Some(&Finding::DeviceOnline)
        );
        assert!(context.outcome_of("restart_edge_module").is_none());
        assert!(context.has_finding(|f| *f == Finding::DeviceOffline));
    }
}
