// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by external services the engine talks to.

use thiserror::Error;

/// Failure of an external collaborator call (IoT hub, module manager, notification sink, ...).
///
/// A collaborator error always means the call itself could not complete. A call that
/// completed and reported a negative fact (device offline, telemetry absent) is not an
/// error and never surfaces through this type.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// The service could not be reached or answered with a transient failure.
    #[error("{service} is unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },

    /// The service answered but refused the request.
    #[error("{service} rejected the request: {message}")]
    Rejected {
        service: &'static str,
        message: String,
    },

    /// Opaque failure bubbled up from a client library.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CollaboratorError {
    pub fn unavailable(service: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            service,
            message: message.into(),
        }
    }

    pub fn rejected(service: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            service,
            message: message.into(),
        }
    }
}
