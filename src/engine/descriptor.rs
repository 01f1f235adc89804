// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Category a step was registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    /// Ordered diagnostic or remediation step, skipped once the chain halts.
    Chain,
    /// Unconditional reporting step, run once after the chain halts or completes.
    Finalizer,
}

impl Display for StepRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StepRole::Chain => write!(f, "chain"),
            StepRole::Finalizer => write!(f, "finalizer"),
        }
    }
}

/// Registration-time metadata for one step.
///
/// Ordinals are dense and follow registration order; the finalizer takes the ordinal
/// after the last chain step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDescriptor {
    pub ordinal: usize,
    pub name: &'static str,
    /// Rust type name of the handler, for diagnostics.
    pub handler_type: &'static str,
    pub role: StepRole,
}

impl StepDescriptor {
    pub fn is_finalizer(&self) -> bool {
        self.role == StepRole::Finalizer
    }
}
