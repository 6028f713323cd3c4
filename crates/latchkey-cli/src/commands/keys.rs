//! Key management commands.
//!
//! `latchkey keys generate` - Generate a new token secret key.

use latchkey_token::SecretKey;
use std::fs;
use std::path::PathBuf;

/// File name used for generated keys.
pub const SECRET_KEY_FILE: &str = "secret.key";

/// Generate a new secret key.
pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let key = SecretKey::generate();

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)?;

        let key_path = output_dir.join(SECRET_KEY_FILE);
        key.save_to_file(&key_path)?;

        println!("✔ Generated secret key: {}", key_path.display());
        println!();
        println!("⚠️  Anyone holding this key can authorize any user. Never commit it.");
        println!();
        println!("Reference it from latchkey.yaml:");
        println!("  token:");
        println!("    secret_key_file: {}", key_path.display());
        println!();
        println!("or set it as an environment variable:");
        println!("  export LATCHKEY_SECRET_KEY=$(cat {})", key_path.display());
    } else {
        println!("{}", key.to_hex());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_key_to_file() {
        let dir = tempdir().unwrap();
        generate(Some(dir.path().to_path_buf())).unwrap();

        let key_path = dir.path().join(SECRET_KEY_FILE);
        let hex = fs::read_to_string(&key_path).unwrap();

        // 32 bytes, hex-encoded
        assert_eq!(hex.trim().len(), 64);
        assert!(SecretKey::load_from_file(&key_path).is_ok());
    }

    #[test]
    fn test_generate_creates_output_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("keys").join("prod");

        generate(Some(nested.clone())).unwrap();
        assert!(nested.join(SECRET_KEY_FILE).exists());
    }
}
