// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for pipeline registration.

use thiserror::Error;

/// Registration mistakes detected when a [`crate::engine::PipelineBuilder`] is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineConfigError {
    /// A second finalizer was registered; a pipeline has at most one.
    #[error("pipeline already has finalizer '{existing}', cannot register '{attempted}'")]
    DuplicateFinalizer {
        existing: &'static str,
        attempted: &'static str,
    },

    /// Neither chain steps nor a finalizer were registered.
    #[error("pipeline has no steps registered")]
    Empty,
}
