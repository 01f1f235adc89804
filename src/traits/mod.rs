// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod collaborators;
pub mod runner;
pub mod step;

pub use collaborators::{
    ActiveAlertStore, Collaborators, ConnectionState, DeviceMappingLookup, DeviceResolver, IotHubClient,
    ModuleManager, NetworkProbe, NotificationSink, RestartResponse, TelemetryMonitor,
};
pub use runner::ResolutionStepRunner;
pub use step::StepHandler;
