// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for remediation run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Run start and completion
//! * Chain halts (stop, failure, cancellation)
//! * Finalizer abandonment

use crate::domain::Termination;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use connector_remediation::observability::messages::pipeline::RunStarted;
///
/// let msg = RunStarted {
///     run_id: "3f1c",
///     chain_steps: 4,
///     has_finalizer: true,
/// };
///
/// assert_eq!(msg.to_string(), "Starting remediation run 3f1c: 4 chain steps, finalizer=true");
/// ```
pub struct RunStarted<'a> {
    pub run_id: &'a str,
    pub chain_steps: usize,
    pub has_finalizer: bool,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting remediation run {}: {} chain steps, finalizer={}",
            self.run_id, self.chain_steps, self.has_finalizer
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            chain_steps = self.chain_steps,
            has_finalizer = self.has_finalizer,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "remediation_run",
            span_name = name,
            run_id = self.run_id,
            chain_steps = self.chain_steps,
        )
    }
}

/// Chain halted by a step.
///
/// # Log Level
/// `info!` for a concluded diagnosis, `warn!` for cancellation, `error!` for a failure
pub struct RunHalted<'a> {
    pub run_id: &'a str,
    pub termination: &'a Termination,
}

impl Display for RunHalted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Remediation run {} halted: {}", self.run_id, self.termination)
    }
}

impl StructuredLog for RunHalted<'_> {
    fn log(&self) {
        match self.termination {
            Termination::Stopped { step, .. } => {
                tracing::info!(run_id = self.run_id, step = *step, "{}", self)
            }
            Termination::Cancelled { step } => {
                tracing::warn!(run_id = self.run_id, step = *step, "{}", self)
            }
            Termination::Failed { step, reason } => tracing::error!(
                run_id = self.run_id,
                step = *step,
                reason = reason.as_str(),
                "{}", self
            ),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_halted",
            span_name = name,
            run_id = self.run_id,
            step = self.termination.step(),
        )
    }
}

/// Run finished, finalizer included.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use connector_remediation::observability::messages::pipeline::RunCompleted;
/// use std::time::Duration;
///
/// let msg = RunCompleted {
///     run_id: "3f1c",
///     executed_steps: 2,
///     termination: None,
///     duration: Duration::from_millis(40),
/// };
///
/// assert!(msg.to_string().contains("chain completed"));
/// ```
pub struct RunCompleted<'a> {
    pub run_id: &'a str,
    pub executed_steps: usize,
    pub termination: Option<&'a Termination>,
    pub duration: Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.termination {
            Some(termination) => write!(
                f,
                "Remediation run {} finished: {} steps executed, {} ({:?})",
                self.run_id, self.executed_steps, termination, self.duration
            ),
            None => write!(
                f,
                "Remediation run {} finished: {} steps executed, chain completed ({:?})",
                self.run_id, self.executed_steps, self.duration
            ),
        }
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            executed_steps = self.executed_steps,
            failed = self.termination.map(Termination::is_failure).unwrap_or(false),
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            run_id = self.run_id,
            executed_steps = self.executed_steps,
            duration = ?self.duration,
        )
    }
}

/// The finalizer could not run or did not finish; the run ends without a report.
///
/// # Log Level
/// `warn!` - Degraded behavior
pub struct FinalizerAbandoned<'a> {
    pub run_id: &'a str,
    pub step: &'a str,
    pub reason: &'a str,
}

impl Display for FinalizerAbandoned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Remediation run {} ends without report, finalizer '{}' abandoned: {}",
            self.run_id, self.step, self.reason
        )
    }
}

impl StructuredLog for FinalizerAbandoned<'_> {
    fn log(&self) {
        tracing::warn!(
            run_id = self.run_id,
            step = self.step,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "finalizer_abandoned",
            span_name = name,
            run_id = self.run_id,
            step = self.step,
        )
    }
}
