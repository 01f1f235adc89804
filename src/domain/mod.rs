// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Value types flowing through a remediation run.
//!
//! * `request` - the immutable facts about one alert occurrence
//! * `outcome` - what a single step reports back to the runner
//! * `context` - the per-run, append-only record of every executed step

mod context;
mod outcome;
mod request;

pub use context::{ResolutionContext, StepRecord, Termination};
pub use outcome::{Finding, RemediationAction, StepOutcome, StepStatus};
pub use request::{ConnectorAlert, DeviceInfo, GatewayIdentity, ResolutionRequest};
