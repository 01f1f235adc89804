// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors a step handler can return instead of an outcome.

use std::time::Duration;
use thiserror::Error;

use super::CollaboratorError;

/// The handler itself could not complete its check or action.
///
/// The runner contains every variant at the step boundary: the step is recorded as
/// failed and the remaining chain is halted. Only [`StepError::Cancelled`] is reported
/// as a cancellation rather than an infrastructure failure.
#[derive(Error, Debug)]
pub enum StepError {
    /// An external call made by the step failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// The step did not finish within the runner's per-step budget.
    #[error("step timed out after {0:?}")]
    TimedOut(Duration),

    /// The step observed the cancellation token and gave up.
    #[error("step was cancelled")]
    Cancelled,

    /// The step panicked; the payload message is preserved when it is a string.
    #[error("step panicked: {0}")]
    Panicked(String),
}
