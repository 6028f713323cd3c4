//! Token minting and verification.

use crate::error::TokenError;
use crate::keys::SecretKey;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Domain separation for the MAC input, bumped if the token format changes.
const TOKEN_CONTEXT: &[u8] = b"latchkey/v1:";

/// Mints and verifies caller-bound authorization tokens.
///
/// A token is the unpadded URL-safe base64 of
/// `HMAC-SHA256(secret, "latchkey/v1:" || caller_id)`. Nothing is stored:
/// verification recomputes the MAC for the claimed caller and compares in
/// constant time.
#[derive(Clone)]
pub struct TokenAuthority {
    mac: HmacSha256,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority").finish_non_exhaustive()
    }
}

impl TokenAuthority {
    /// Create an authority keyed with the given secret.
    pub fn new(key: &SecretKey) -> Result<Self, TokenError> {
        let mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| TokenError::InvalidSecretKey(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Create an authority with a freshly generated key.
    ///
    /// Tokens minted by it do not survive a process restart.
    pub fn ephemeral() -> Result<Self, TokenError> {
        Self::new(&SecretKey::generate())
    }

    fn keyed(&self, caller: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(TOKEN_CONTEXT);
        mac.update(caller.as_bytes());
        mac
    }

    /// Mint the token for `caller`.
    ///
    /// Deterministic for a given key, so minting twice yields the same token.
    pub fn mint(&self, caller: &str) -> String {
        let tag = self.keyed(caller).finalize().into_bytes();
        URL_SAFE_NO_PAD.encode(tag)
    }

    /// Check that `token` was minted for `caller` under the current key.
    ///
    /// The token is decoded exactly as given: surrounding whitespace or any
    /// other string `mint` never produced is rejected. Empty inputs,
    /// undecodable tokens and mismatches all return `false`.
    pub fn verify(&self, caller: &str, token: &str) -> bool {
        if caller.is_empty() || token.is_empty() {
            tracing::debug!("Token verification rejected empty input");
            return false;
        }

        let Ok(tag) = URL_SAFE_NO_PAD.decode(token) else {
            tracing::debug!(caller = %caller, "Token is not valid base64");
            return false;
        };

        match self.keyed(caller).verify_slice(&tag) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(caller = %caller, "Token MAC mismatch");
                false
            }
        }
    }
}
