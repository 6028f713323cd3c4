//! Secret key management for authorization tokens.

use crate::error::TokenError;
use rand::RngCore;
use std::fmt;
use std::path::Path;

/// Length of generated keys in bytes.
pub const SECRET_KEY_LEN: usize = 32;

/// Shortest key accepted when loading.
pub const MIN_SECRET_KEY_LEN: usize = 16;

/// Symmetric key used to mint and verify authorization tokens.
///
/// Read-only once loaded. Replacing it invalidates all tokens minted under
/// the old key.
#[derive(Clone)]
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl SecretKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut bytes = vec![0u8; SECRET_KEY_LEN];
        rng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TokenError> {
        if bytes.len() < MIN_SECRET_KEY_LEN {
            return Err(TokenError::InvalidSecretKey(format!(
                "expected at least {} bytes, got {}",
                MIN_SECRET_KEY_LEN,
                bytes.len()
            )));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Load a key from a hex-encoded string.
    pub fn from_hex(hex: &str) -> Result<Self, TokenError> {
        let bytes =
            hex::decode(hex.trim()).map_err(|e| TokenError::InvalidSecretKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Get the key as hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Save the key to a file as hex.
    pub fn save_to_file(&self, path: &Path) -> Result<(), TokenError> {
        std::fs::write(path, self.to_hex())?;
        Ok(())
    }

    /// Load a key from a file containing hex.
    pub fn load_from_file(path: &Path) -> Result<Self, TokenError> {
        let hex = std::fs::read_to_string(path)?;
        Self::from_hex(hex.trim())
    }
}
