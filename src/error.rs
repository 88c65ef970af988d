//! Error types and handling for the stamping and verification core

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Custom result type for stamping and verification operations
pub type Result<T> = StdResult<T, Error>;

/// Core error taxonomy.
///
/// Verification verdicts (`valid` / `invalid` / `not_found`) are *not* errors;
/// they are returned as [`crate::types::VerificationResult`] values. Only
/// infrastructure and input failures surface through this type, so an
/// `invalid` verdict can never be produced by a backend outage.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Input bytes are not a parseable PDF. Not retryable with the same bytes.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The verification payload exceeds QR capacity at the fixed
    /// error-correction level. The hash must never be silently truncated.
    #[error("verification payload of {length} bytes exceeds encoding capacity")]
    PayloadTooLarge { length: usize },

    /// Image or font embedding was rejected while building the stamp.
    #[error("encoding failure: {0}")]
    EncodingFailure(String),

    /// The registry backend could not be reached or gave a garbled response.
    /// Transient; the caller may retry.
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::MalformedDocument(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::EncodingFailure(err.to_string())
    }
}
