// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // collaborator backends
pub mod config;     // config + runtime wiring
pub mod consumer;   // alert intake
pub mod domain;     // request, outcome, context
pub mod engine;     // pipeline builder + runner
pub mod errors;     // error handling
pub mod observability;
pub mod steps;      // remediation steps
pub mod traits;     // unified abstractions
