// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scripted step handlers for runner and builder tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::domain::{Finding, ResolutionContext, StepOutcome};
use crate::errors::{CollaboratorError, StepError};
use crate::traits::StepHandler;

/// Returns a fixed outcome for any request type and counts its invocations.
#[derive(Clone)]
pub struct ScriptedStep {
    name: &'static str,
    outcome: StepOutcome,
    calls: Arc<AtomicUsize>,
    journal: Option<Arc<Mutex<Vec<&'static str>>>>,
    cancels: Option<CancellationToken>,
}

impl ScriptedStep {
    pub fn new(name: &'static str, outcome: StepOutcome) -> Self {
        Self {
            name,
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
            journal: None,
            cancels: None,
        }
    }

    /// Appends the step name to a journal shared with other steps on every invocation.
    pub fn journal(mut self, journal: Arc<Mutex<Vec<&'static str>>>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Cancels `token` while executing, as if the message lock was lost mid-step.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancels = Some(token);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl<R: Send + Sync> StepHandler<R> for ScriptedStep {
    async fn execute(
        &self,
        _request: &R,
        _context: &ResolutionContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome, StepError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push(self.name);
        }
        if let Some(token) = &self.cancels {
            token.cancel();
        }
        Ok(self.outcome.clone())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Fails with a collaborator outage every time.
pub struct FailingStep {
    name: &'static str,
}

impl FailingStep {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl<R: Send + Sync> StepHandler<R> for FailingStep {
    async fn execute(
        &self,
        _request: &R,
        _context: &ResolutionContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome, StepError> {
        Err(CollaboratorError::unavailable("stub service", "simulated outage").into())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Panics every time.
pub struct PanickingStep {
    name: &'static str,
}

impl PanickingStep {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl<R: Send + Sync> StepHandler<R> for PanickingStep {
    async fn execute(
        &self,
        _request: &R,
        _context: &ResolutionContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome, StepError> {
        panic!("simulated handler bug");
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Waits `delay` before continuing, giving up early when cancelled.
pub struct SlowStep {
    name: &'static str,
    delay: Duration,
}

impl SlowStep {
    pub fn new(name: &'static str, delay: Duration) -> Self {
        Self { name, delay }
    }
}

#[async_trait]
impl<R: Send + Sync> StepHandler<R> for SlowStep {
    async fn execute(
        &self,
        _request: &R,
        _context: &ResolutionContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, StepError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(StepError::Cancelled),
            _ = tokio::time::sleep(self.delay) => Ok(StepOutcome::proceed(Finding::DeviceOnline)),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
