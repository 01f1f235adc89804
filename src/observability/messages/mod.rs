// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it with structured fields at its intended level.
//!
//! # Usage Pattern
//!
//! ```rust
//! use connector_remediation::observability::messages::{pipeline::RunStarted, StructuredLog};
//!
//! let msg = RunStarted {
//!     run_id: "3f1c",
//!     chain_steps: 4,
//!     has_finalizer: true,
//! };
//!
//! let span = msg.span("remediation_run");
//! let _guard = span.enter();
//! msg.log();
//! ```

pub mod consumer;
pub mod notification;
pub mod pipeline;
pub mod step;

use tracing::Span;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emits the event at the message's level.
    fn log(&self);

    /// Creates a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
