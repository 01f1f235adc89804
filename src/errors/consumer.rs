// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::CollaboratorError;

/// Errors the alert consumer hands back to the transport.
///
/// Returning an error means the message must not be acknowledged; every other outcome,
/// including a resolution miss or a malformed payload, is acknowledged. Neither variant
/// says anything about the alert itself, so redelivery may succeed.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// The device resolver could not answer; retrying the message may succeed.
    #[error("device resolution for connector '{connector_name}' failed: {source}")]
    Resolution {
        connector_name: String,
        #[source]
        source: CollaboratorError,
    },

    /// The processing attempt was cancelled before a run started.
    #[error("alert processing was cancelled before a run started")]
    Cancelled,
}
