//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use crate::handler::CredentialAssessment;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    /// A required request field was missing or blank.
    #[error("{field} is required")]
    InvalidArgument { field: &'static str },

    /// The generation service call failed or was rejected.
    #[error("Generation service error: {0}")]
    Upstream(String),

    /// An upstream failure, classified for the caller.
    #[error("{details}")]
    GenerationFailed {
        details: String,
        credential: CredentialAssessment,
    },

    /// The normalized batch violated its invariants even after fallback.
    #[error("Malformed thumbnail batch: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
