// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

use super::PipelineConfigError;

/// Errors that can occur while loading configuration or assembling the runtime from it.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One entry per violated rule, reported together.
    #[error("configuration validation failed:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),

    #[error(transparent)]
    Pipeline(#[from] PipelineConfigError),
}
