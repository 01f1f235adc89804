// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline registration.
//!
//! A pipeline is assembled once at process start by a plain composition function and
//! never changes afterwards:
//!
//! ```
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use connector_remediation::domain::{Finding, ResolutionContext, StepOutcome};
//! use connector_remediation::engine::Pipeline;
//! use connector_remediation::errors::StepError;
//! use connector_remediation::traits::StepHandler;
//!
//! struct Ping;
//!
//! #[async_trait]
//! impl StepHandler<String> for Ping {
//!     async fn execute(
//!         &self,
//!         _request: &String,
//!         _context: &ResolutionContext,
//!         _cancel: &CancellationToken,
//!     ) -> Result<StepOutcome, StepError> {
//!         Ok(StepOutcome::proceed(Finding::DeviceOnline))
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "ping"
//!     }
//! }
//!
//! let runner = Pipeline::configure::<String>()
//!     .add_handler(Ping)
//!     .add_handler_with(|| Ping)
//!     .build()
//!     .unwrap();
//!
//! let ordinals: Vec<usize> = runner.descriptors().iter().map(|d| d.ordinal).collect();
//! assert_eq!(ordinals, vec![0, 1]);
//! ```
//!
//! `build` consumes the builder, so registering a step on a built pipeline does not
//! compile.

use std::sync::Arc;

use crate::engine::descriptor::{StepDescriptor, StepRole};
use crate::engine::runner::{PipelineRunner, RunnerOptions};
use crate::errors::PipelineConfigError;
use crate::traits::StepHandler;

/// Entry point of the configuration surface.
pub struct Pipeline;

impl Pipeline {
    /// Starts a registration session for request type `R`.
    pub fn configure<R: Send + Sync + 'static>() -> PipelineBuilder<R> {
        PipelineBuilder::new()
    }
}

/// A handler bound to its registration metadata.
pub(crate) struct RegisteredStep<R> {
    pub(crate) descriptor: StepDescriptor,
    pub(crate) handler: Arc<dyn StepHandler<R>>,
}

impl<R> RegisteredStep<R> {
    pub(crate) fn name(&self) -> &'static str {
        self.descriptor.name
    }
}

/// Ordered step registration for one request type.
///
/// Position is call order. Registering the same handler type twice is allowed and it
/// then runs twice. Mistakes that cannot be caught by the type system are kept until
/// [`PipelineBuilder::build`] so the chain of calls stays fluent.
pub struct PipelineBuilder<R> {
    chain: Vec<RegisteredStep<R>>,
    finalizer: Option<(&'static str, &'static str, Arc<dyn StepHandler<R>>)>,
    options: RunnerOptions,
    error: Option<PipelineConfigError>,
}

impl<R: Send + Sync + 'static> PipelineBuilder<R> {
    fn new() -> Self {
        Self {
            chain: Vec::new(),
            finalizer: None,
            options: RunnerOptions::default(),
            error: None,
        }
    }

    /// Appends a chain step.
    pub fn add_handler<H>(mut self, handler: H) -> Self
    where
        H: StepHandler<R> + 'static,
    {
        let descriptor = StepDescriptor {
            ordinal: self.chain.len(),
            name: handler.name(),
            handler_type: std::any::type_name::<H>(),
            role: StepRole::Chain,
        };
        self.chain.push(RegisteredStep {
            descriptor,
            handler: Arc::new(handler),
        });
        self
    }

    /// Appends a chain step built by `factory`.
    pub fn add_handler_with<F, H>(self, factory: F) -> Self
    where
        F: FnOnce() -> H,
        H: StepHandler<R> + 'static,
    {
        self.add_handler(factory())
    }

    /// Registers the unconditional finalizer. A pipeline has at most one.
    pub fn finalize_with<H>(mut self, handler: H) -> Self
    where
        H: StepHandler<R> + 'static,
    {
        match &self.finalizer {
            Some((existing, _, _)) => {
                if self.error.is_none() {
                    self.error = Some(PipelineConfigError::DuplicateFinalizer {
                        existing: *existing,
                        attempted: handler.name(),
                    });
                }
            }
            None => {
                self.finalizer = Some((handler.name(), std::any::type_name::<H>(), Arc::new(handler)));
            }
        }
        self
    }

    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    /// Freezes the registration into a runner.
    pub fn build(self) -> Result<PipelineRunner<R>, PipelineConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.chain.is_empty() && self.finalizer.is_none() {
            return Err(PipelineConfigError::Empty);
        }

        let finalizer_ordinal = self.chain.len();
        let finalizer = self.finalizer.map(|(name, handler_type, handler)| RegisteredStep {
            descriptor: StepDescriptor {
                ordinal: finalizer_ordinal,
                name,
                handler_type,
                role: StepRole::Finalizer,
            },
            handler,
        });

        Ok(PipelineRunner::new(self.chain, finalizer, self.options))
    }
}
