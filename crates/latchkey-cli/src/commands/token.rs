//! Token commands.
//!
//! `latchkey token mint` - Mint the authorization token for a caller.
//! `latchkey token verify` - Check a token against a caller.
//!
//! Useful for operators completing a handshake by hand, or for checking that
//! two deployments share the same key.

use anyhow::Context;
use latchkey_core::CallerId;
use latchkey_mcp::authorization_url;
use latchkey_token::{SecretKey, TokenAuthority};
use std::path::Path;
use url::Url;

/// Resolve a secret key from either a file path or a hex-encoded string.
///
/// The key string can be:
/// - A path to a file containing a hex-encoded key
/// - A hex-encoded key directly (e.g., from LATCHKEY_SECRET_KEY)
pub fn resolve_secret_key(key: Option<String>) -> anyhow::Result<SecretKey> {
    let key_str = key.context(
        "Secret key not provided. Either pass --key <path> or set LATCHKEY_SECRET_KEY env var",
    )?;

    let path = Path::new(&key_str);
    if path.exists() {
        return SecretKey::load_from_file(path)
            .with_context(|| format!("Failed to load secret key from file: {}", path.display()));
    }

    SecretKey::from_hex(key_str.trim()).context("Failed to parse secret key. Expected hex")
}

/// Mint the token for `user` and print it.
pub fn mint(key: Option<String>, user: &str, base_url: Option<&Url>) -> anyhow::Result<()> {
    let authority = TokenAuthority::new(&resolve_secret_key(key)?)?;
    let token = authority.mint(user);

    println!("{}", token);
    if let Some(base) = base_url {
        println!();
        println!("Authorization URL:");
        println!("  {}", authorization_url(base, &CallerId::new(user), &token));
    }

    Ok(())
}

/// Verify `token` for `user`. Returns whether it is valid.
pub fn verify(key: Option<String>, user: &str, token: &str) -> anyhow::Result<bool> {
    let authority = TokenAuthority::new(&resolve_secret_key(key)?)?;

    if authority.verify(user, token) {
        println!("✔ Token is valid for user {}", user);
        Ok(true)
    } else {
        println!("✖ Token is not valid for user {}", user);
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_key_from_file() {
        let dir = tempdir().unwrap();
        let key_path = dir.path().join("secret.key");
        let key = SecretKey::generate();
        key.save_to_file(&key_path).unwrap();

        let resolved = resolve_secret_key(Some(key_path.to_string_lossy().to_string())).unwrap();
        assert_eq!(resolved.to_hex(), key.to_hex());
    }

    #[test]
    fn test_resolve_key_from_hex() {
        let key = SecretKey::generate();
        let resolved = resolve_secret_key(Some(format!("  {}\n", key.to_hex()))).unwrap();
        assert_eq!(resolved.to_hex(), key.to_hex());
    }

    #[test]
    fn test_resolve_key_missing() {
        let err = resolve_secret_key(None).unwrap_err();
        assert!(err.to_string().contains("LATCHKEY_SECRET_KEY"));
    }

    #[test]
    fn test_resolve_key_garbage() {
        assert!(resolve_secret_key(Some("not-a-key".to_string())).is_err());
    }

    #[test]
    fn test_mint_then_verify() {
        let key = SecretKey::generate();
        let token = TokenAuthority::new(&key).unwrap().mint("alice");

        mint(Some(key.to_hex()), "alice", None).unwrap();
        assert!(verify(Some(key.to_hex()), "alice", &token).unwrap());
        assert!(!verify(Some(key.to_hex()), "bob", &token).unwrap());
    }

    #[test]
    fn test_verify_does_not_trim_token() {
        let key = SecretKey::generate();
        let token = TokenAuthority::new(&key).unwrap().mint("alice");

        assert!(!verify(Some(key.to_hex()), "alice", &format!("{token}\n")).unwrap());
    }

    #[test]
    fn test_mint_with_base_url() {
        let key = SecretKey::generate();
        let base = Url::parse("http://localhost:30000/auth").unwrap();
        assert!(mint(Some(key.to_hex()), "alice", Some(&base)).is_ok());
    }
}
