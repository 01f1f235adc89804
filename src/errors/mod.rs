// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod collaborator;
mod config;
mod consumer;
mod pipeline;
mod step;

pub use collaborator::CollaboratorError;
pub use config::ConfigError;
pub use consumer::ConsumerError;
pub use pipeline::PipelineConfigError;
pub use step::StepError;
