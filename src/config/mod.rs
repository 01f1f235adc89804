// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod runtime;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, ChannelConfig, Config, ConsumerConfig, NotificationConfig,
    RunnerConfig, SimulationConfig, TelemetryConfig,
};
pub use runtime::RuntimeBuilder;
