// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Log events are struct-based message types implementing `Display` and
//! [`messages::StructuredLog`], so every event carries the same fields whether it is
//! rendered as text or consumed as structured output.
//!
//! Messages are organized by subsystem:
//! * `messages::pipeline` - run lifecycle (start, halt, completion)
//! * `messages::step` - step invocation, skip, failure
//! * `messages::consumer` - alert intake, resolution, acknowledgement
//!
//! # Usage
//!
//! ```rust
//! use connector_remediation::observability::messages::{step::StepFailed, StructuredLog};
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "module API returned 503");
//! StepFailed {
//!     step: "restart_edge_module",
//!     ordinal: 2,
//!     error: &error,
//! }
//! .log();
//! ```

pub mod messages;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Calling this twice is harmless,
/// the second installation is ignored.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}
