// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Step pipeline: registration ([`Pipeline`], [`PipelineBuilder`]) and execution
//! ([`PipelineRunner`]).

pub mod builder;
pub mod descriptor;
pub mod runner;

pub use builder::{Pipeline, PipelineBuilder};
pub use descriptor::{StepDescriptor, StepRole};
pub use runner::{PipelineRunner, RunnerOptions};
