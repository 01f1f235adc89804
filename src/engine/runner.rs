// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sequential pipeline runner with short-circuit and failure policy.
//!
//! # Execution Flow
//!
//! 1. Chain steps run strictly one after another in registration order. Each step may
//!    read what earlier steps recorded, so nothing runs in parallel within a run.
//! 2. A `Stop` or `Fail` outcome, an error, a timeout or a panic halts the chain. The
//!    remaining chain steps are skipped and leave no record.
//! 3. A cancelled token is checked before every chain step and halts the chain the same
//!    way, recorded as a cancellation.
//! 4. The finalizer runs exactly once afterwards, whatever happened to the chain. After
//!    a cancellation it gets a fresh token and the configured grace period; with no grace
//!    the run ends without a report.
//!
//! Nothing a step does escapes the runner: errors, timeouts and panics are all contained
//! at the step boundary and recorded in the context.

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::consts::{DEFAULT_FINALIZER_GRACE_SECS, DEFAULT_STEP_TIMEOUT_SECS};
use crate::domain::{Finding, ResolutionContext, StepOutcome, StepRecord, StepStatus, Termination};
use crate::engine::builder::RegisteredStep;
use crate::engine::descriptor::StepDescriptor;
use crate::errors::StepError;
use crate::observability::messages::pipeline::{FinalizerAbandoned, RunCompleted, RunHalted, RunStarted};
use crate::observability::messages::step::{StepCompleted, StepFailed, StepSkipped, StepStarted};
use crate::observability::messages::StructuredLog;
use crate::traits::ResolutionStepRunner;

/// Time budgets applied by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Upper bound for a single step invocation. Must stay below the message lock
    /// duration of the transport, or the message is redelivered while still running.
    pub step_timeout: Duration,
    /// Time the finalizer gets to report after the run was cancelled. Zero skips the
    /// report on cancellation.
    pub finalizer_grace: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(DEFAULT_STEP_TIMEOUT_SECS),
            finalizer_grace: Duration::from_secs(DEFAULT_FINALIZER_GRACE_SECS),
        }
    }
}

/// Immutable, ordered set of steps for request type `R`, produced by
/// [`crate::engine::PipelineBuilder::build`].
///
/// The runner holds no per-run state; one instance behind an `Arc` serves any number of
/// concurrent runs, each with its own [`ResolutionContext`].
pub struct PipelineRunner<R> {
    chain: Vec<RegisteredStep<R>>,
    finalizer: Option<RegisteredStep<R>>,
    options: RunnerOptions,
}

impl<R> std::fmt::Debug for PipelineRunner<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("chain", &self.chain.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("finalizer", &self.finalizer.as_ref().map(|s| s.name()))
            .field("options", &self.options)
            .finish()
    }
}

impl<R: Send + Sync + 'static> PipelineRunner<R> {
    pub(crate) fn new(
        chain: Vec<RegisteredStep<R>>,
        finalizer: Option<RegisteredStep<R>>,
        options: RunnerOptions,
    ) -> Self {
        Self {
            chain,
            finalizer,
            options,
        }
    }

    /// Chain descriptors in order, followed by the finalizer's.
    pub fn descriptors(&self) -> Vec<&StepDescriptor> {
        self.chain
            .iter()
            .chain(self.finalizer.iter())
            .map(|s| &s.descriptor)
            .collect()
    }

    /// Runs every registered step against one request/context pair.
    pub async fn run(&self, request: &R, context: &mut ResolutionContext, cancel: &CancellationToken) {
        let run_id = context.run_id().to_string();
        let started = RunStarted {
            run_id: &run_id,
            chain_steps: self.chain.len(),
            has_finalizer: self.finalizer.is_some(),
        };
        let span = started.span("remediation_run");

        async {
            started.log();
            let start_time = Instant::now();

            for step in &self.chain {
                if let Some(termination) = context.termination() {
                    StepSkipped {
                        step: step.name(),
                        ordinal: step.descriptor.ordinal,
                        halted_by: termination.step(),
                    }
                    .log();
                    continue;
                }

                if cancel.is_cancelled() {
                    halt(context, Termination::Cancelled { step: step.name() }, &run_id);
                    continue;
                }

                let (result, elapsed) = invoke(step, request, context, cancel, self.options.step_timeout).await;
                record(step, result, elapsed, context, &run_id);
            }

            self.run_finalizer(request, context, cancel, &run_id).await;

            RunCompleted {
                run_id: &run_id,
                executed_steps: context.records().len(),
                termination: context.termination(),
                duration: start_time.elapsed(),
            }
            .log();
        }
        .instrument(span)
        .await
    }

    async fn run_finalizer(
        &self,
        request: &R,
        context: &mut ResolutionContext,
        cancel: &CancellationToken,
        run_id: &str,
    ) {
        let Some(finalizer) = &self.finalizer else {
            return;
        };

        if !cancel.is_cancelled() {
            let (result, elapsed) = invoke(finalizer, request, context, cancel, self.options.step_timeout).await;
            record(finalizer, result, elapsed, context, run_id);
            return;
        }

        let grace = self.options.finalizer_grace;
        if grace.is_zero() {
            FinalizerAbandoned {
                run_id,
                step: finalizer.name(),
                reason: "run cancelled and no finalizer grace configured",
            }
            .log();
            return;
        }

        // The attempt's token is already cancelled; the report gets its own window.
        let grace_token = CancellationToken::new();
        let (result, elapsed) = invoke(finalizer, request, context, &grace_token, grace).await;
        match result {
            Err(StepError::TimedOut(_)) => FinalizerAbandoned {
                run_id,
                step: finalizer.name(),
                reason: "finalizer grace period elapsed",
            }
            .log(),
            result => record(finalizer, result, elapsed, context, run_id),
        }
    }
}

#[async_trait]
impl<R: Send + Sync + 'static> ResolutionStepRunner<R> for PipelineRunner<R> {
    async fn run(&self, request: &R, context: &mut ResolutionContext, cancel: &CancellationToken) {
        PipelineRunner::run(self, request, context, cancel).await
    }
}

/// Invokes one step under the time budget, converting a timeout or a panic into a
/// [`StepError`].
async fn invoke<R: Send + Sync + 'static>(
    step: &RegisteredStep<R>,
    request: &R,
    context: &ResolutionContext,
    cancel: &CancellationToken,
    budget: Duration,
) -> (Result<StepOutcome, StepError>, Duration) {
    StepStarted {
        step: step.name(),
        ordinal: step.descriptor.ordinal,
        role: step.descriptor.role,
    }
    .log();

    let start_time = Instant::now();
    let execution = tokio::time::timeout(budget, step.handler.execute(request, context, cancel));

    let result = match AssertUnwindSafe(execution).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(_elapsed)) => Err(StepError::TimedOut(budget)),
        Err(payload) => Err(StepError::Panicked(panic_message(payload.as_ref()))),
    };

    (result, start_time.elapsed())
}

/// Appends the step's record and applies the halt policy.
fn record<R>(
    step: &RegisteredStep<R>,
    result: Result<StepOutcome, StepError>,
    elapsed: Duration,
    context: &mut ResolutionContext,
    run_id: &str,
) {
    let descriptor = &step.descriptor;

    let (outcome, termination) = match result {
        Ok(outcome) => {
            StepCompleted {
                step: descriptor.name,
                ordinal: descriptor.ordinal,
                status: outcome.status,
                finding: &outcome.finding,
                duration: elapsed,
            }
            .log();

            let termination = outcome.halts().then(|| match outcome.status {
                StepStatus::Fail => Termination::Failed {
                    step: descriptor.name,
                    reason: outcome.finding.to_string(),
                },
                _ => Termination::Stopped {
                    step: descriptor.name,
                    finding: outcome.finding.clone(),
                },
            });
            (outcome, termination)
        }
        Err(StepError::Cancelled) => (
            StepOutcome::fail(Finding::Interrupted),
            Some(Termination::Cancelled { step: descriptor.name }),
        ),
        Err(error) => {
            StepFailed {
                step: descriptor.name,
                ordinal: descriptor.ordinal,
                error: &error,
            }
            .log();

            let reason = error.to_string();
            (
                StepOutcome::fail(Finding::Error { message: reason.clone() }),
                Some(Termination::Failed {
                    step: descriptor.name,
                    reason,
                }),
            )
        }
    };

    context.append(StepRecord::from_outcome(
        descriptor.ordinal,
        descriptor.name,
        descriptor.role,
        outcome,
        elapsed,
    ));

    if let Some(termination) = termination {
        halt(context, termination, run_id);
    }
}

fn halt(context: &mut ResolutionContext, termination: Termination, run_id: &str) {
    if context.is_halted() {
        return;
    }
    RunHalted {
        run_id,
        termination: &termination,
    }
    .log();
    context.terminate(termination);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{FailingStep, PanickingStep, ScriptedStep, SlowStep};
    use crate::engine::{Pipeline, StepRole};
    use std::sync::Arc;

    fn proceed(name: &'static str) -> ScriptedStep {
        ScriptedStep::new(name, StepOutcome::proceed(Finding::DeviceOnline))
    }

    #[tokio::test]
    async fn test_steps_run_in_registration_order() {
        let journal = Arc::new(std::sync::Mutex::new(Vec::new()));
        let runner = Pipeline::configure::<String>()
            .add_handler(proceed("a").journal(journal.clone()))
            .add_handler(proceed("b").journal(journal.clone()))
            .add_handler(proceed("c").journal(journal.clone()))
            .finalize_with(proceed("report").journal(journal.clone()))
            .build()
            .unwrap();

        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &CancellationToken::new()).await;

        assert_eq!(*journal.lock().unwrap(), vec!["a", "b", "c", "report"]);
        assert_eq!(context.executed_steps(), vec!["a", "b", "c", "report"]);
        assert!(context.termination().is_none());
        assert_eq!(context.records()[3].role, StepRole::Finalizer);
    }

    #[tokio::test]
    async fn test_stop_skips_remaining_chain_but_not_finalizer() {
        let skipped = proceed("never");
        let skipped_calls = skipped.calls();
        let runner = Pipeline::configure::<String>()
            .add_handler(proceed("a"))
            .add_handler(ScriptedStep::new("b", StepOutcome::stop(Finding::DeviceOffline)))
            .add_handler(skipped)
            .finalize_with(proceed("report"))
            .build()
            .unwrap();

        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &CancellationToken::new()).await;

        assert_eq!(context.executed_steps(), vec!["a", "b", "report"]);
        assert_eq!(skipped_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(
            context.termination(),
            Some(&Termination::Stopped {
                step: "b",
                finding: Finding::DeviceOffline,
            })
        );
    }

    #[tokio::test]
    async fn test_fail_outcome_is_recorded_as_failure() {
        let runner = Pipeline::configure::<String>()
            .add_handler(ScriptedStep::new(
                "a",
                StepOutcome::fail(Finding::Error {
                    message: "quota exceeded".to_string(),
                }),
            ))
            .add_handler(proceed("b"))
            .finalize_with(proceed("report"))
            .build()
            .unwrap();

        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &CancellationToken::new()).await;

        assert_eq!(context.executed_steps(), vec!["a", "report"]);
        let termination = context.termination().unwrap();
        assert!(termination.is_failure());
        assert_eq!(termination.step(), "a");
    }

    #[tokio::test]
    async fn test_error_is_contained_and_halts_chain() {
        let runner = Pipeline::configure::<String>()
            .add_handler(proceed("a"))
            .add_handler(FailingStep::new("b"))
            .add_handler(proceed("c"))
            .finalize_with(proceed("report"))
            .build()
            .unwrap();

        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &CancellationToken::new()).await;

        assert_eq!(context.executed_steps(), vec!["a", "b", "report"]);
        let failed = context.outcome_of("b").unwrap();
        assert_eq!(failed.status, StepStatus::Fail);
        assert!(matches!(failed.finding, Finding::Error { .. }));
        assert!(context.termination().unwrap().is_failure());
    }

    #[tokio::test]
    async fn test_panic_is_contained_at_step_boundary() {
        let runner = Pipeline::configure::<String>()
            .add_handler(PanickingStep::new("explodes"))
            .add_handler(proceed("after"))
            .finalize_with(proceed("report"))
            .build()
            .unwrap();

        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &CancellationToken::new()).await;

        assert_eq!(context.executed_steps(), vec!["explodes", "report"]);
        match context.termination() {
            Some(Termination::Failed { step, reason }) => {
                assert_eq!(*step, "explodes");
                assert!(reason.contains("simulated handler bug"));
            }
            other => panic!("Expected failed termination, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_timeout_is_a_failure() {
        let runner = Pipeline::configure::<String>()
            .add_handler(SlowStep::new("hangs", Duration::from_secs(600)))
            .finalize_with(proceed("report"))
            .with_options(RunnerOptions {
                step_timeout: Duration::from_secs(5),
                finalizer_grace: Duration::from_secs(1),
            })
            .build()
            .unwrap();

        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &CancellationToken::new()).await;

        assert_eq!(context.executed_steps(), vec!["hangs", "report"]);
        assert_eq!(
            context.termination(),
            Some(&Termination::Failed {
                step: "hangs",
                reason: "step timed out after 5s".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start_still_reports_within_grace() {
        let first = proceed("a");
        let first_calls = first.calls();
        let runner = Pipeline::configure::<String>()
            .add_handler(first)
            .finalize_with(proceed("report"))
            .build()
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &cancel).await;

        assert_eq!(first_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(context.executed_steps(), vec!["report"]);
        assert_eq!(context.termination(), Some(&Termination::Cancelled { step: "a" }));
    }

    #[tokio::test]
    async fn test_cancelled_without_grace_ends_without_report() {
        let runner = Pipeline::configure::<String>()
            .add_handler(proceed("a"))
            .finalize_with(proceed("report"))
            .with_options(RunnerOptions {
                step_timeout: Duration::from_secs(5),
                finalizer_grace: Duration::ZERO,
            })
            .build()
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &cancel).await;

        assert!(context.records().is_empty());
        assert_eq!(context.termination(), Some(&Termination::Cancelled { step: "a" }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finalizer_past_grace_is_abandoned() {
        let runner = Pipeline::configure::<String>()
            .add_handler(proceed("a"))
            .finalize_with(SlowStep::new("report", Duration::from_secs(60)))
            .with_options(RunnerOptions {
                step_timeout: Duration::from_secs(90),
                finalizer_grace: Duration::from_secs(2),
            })
            .build()
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &cancel).await;

        assert!(context.records().is_empty());
        assert_eq!(context.termination(), Some(&Termination::Cancelled { step: "a" }));
    }

    #[tokio::test]
    async fn test_cancellation_mid_chain_stops_remaining_steps() {
        let cancel = CancellationToken::new();
        let runner = Pipeline::configure::<String>()
            .add_handler(proceed("a").cancelling(cancel.clone()))
            .add_handler(proceed("b"))
            .finalize_with(proceed("report"))
            .build()
            .unwrap();

        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &cancel).await;

        assert_eq!(context.executed_steps(), vec!["a", "report"]);
        assert_eq!(context.termination(), Some(&Termination::Cancelled { step: "b" }));
    }

    #[tokio::test]
    async fn test_finalizer_failure_does_not_replace_termination() {
        let runner = Pipeline::configure::<String>()
            .add_handler(ScriptedStep::new("a", StepOutcome::stop(Finding::DeviceOffline)))
            .finalize_with(FailingStep::new("report"))
            .build()
            .unwrap();

        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &CancellationToken::new()).await;

        assert_eq!(context.executed_steps(), vec!["a", "report"]);
        assert_eq!(context.outcome_of("report").unwrap().status, StepStatus::Fail);
        assert_eq!(context.termination().unwrap().step(), "a");
    }

    #[tokio::test]
    async fn test_duplicate_registration_runs_twice() {
        let step = proceed("probe");
        let calls = step.calls();
        let runner = Pipeline::configure::<String>()
            .add_handler(step.clone())
            .add_handler(step)
            .build()
            .unwrap();

        let mut context = ResolutionContext::new();
        runner.run(&"alert".to_string(), &mut context, &CancellationToken::new()).await;

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
        let ordinals: Vec<usize> = context.records().iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_concurrent_runs_do_not_share_context() {
        let runner = Arc::new(
            Pipeline::configure::<String>()
                .add_handler(proceed("a"))
                .finalize_with(proceed("report"))
                .build()
                .unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..8 {
            let runner = runner.clone();
            handles.push(tokio::spawn(async move {
                let mut context = ResolutionContext::new();
                runner.run(&format!("alert-{}", i), &mut context, &CancellationToken::new()).await;
                context
            }));
        }

        for handle in handles {
            let context = handle.await.unwrap();
            assert_eq!(context.executed_steps(), vec!["a", "report"]);
        }
    }
}
