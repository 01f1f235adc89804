// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Collaborator and step backends.
//!
//! ## In-Memory Backend
//! A simulated gateway fleet implementing every collaborator trait. The demo binary
//! drives it from the `simulation` section of the configuration and the tests build
//! it in code.
//!
//! ## Stub Backend (Test-Only)
//! Scripted step handlers for runner tests (only available in test builds):
//! - **ScriptedStep**: fixed outcome, counts invocations, optional shared journal
//! - **FailingStep**: always returns a collaborator error
//! - **PanickingStep**: panics on every call
//! - **SlowStep**: waits, honoring cancellation
//!
//! Real integrations (IoT hub SDK, module management API, notification channel) plug in
//! by implementing the traits in [`crate::traits`].

pub mod in_memory;
#[cfg(test)]
pub mod stub;
