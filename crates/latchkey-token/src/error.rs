//! Error types for the token crate.

use thiserror::Error;

/// Errors that can occur while loading or creating secret keys.
///
/// Token verification itself never fails with an error; a bad token is a
/// plain `false`.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Failed to parse the secret key.
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
