//! Error taxonomy for the air-quality pipeline.
//!
//! Field-level parse failures, unmatched site ids, and empty inputs are not
//! errors at all: they are recovered where they occur (see `models` and
//! `aggregate`). What remains here are the failures that must stop a run.

use thiserror::Error;

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ---
    /// Invalid category table or other contract violation in configuration.
    /// Aborts the run; never downgraded to a default.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The Reading Store or Site Directory could not be read.
    #[error("failed to load {source_name}: {message}")]
    Load {
        source_name: &'static str,
        message: String,
    },
}

impl PipelineError {
    // ---
    pub fn configuration(msg: impl Into<String>) -> Self {
        PipelineError::Configuration(msg.into())
    }

    pub fn load(source_name: &'static str, err: impl std::fmt::Display) -> Self {
        PipelineError::Load {
            source_name,
            message: err.to_string(),
        }
    }
}
