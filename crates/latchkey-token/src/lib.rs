//! # latchkey-token
//!
//! Stateless authorization tokens for Latchkey.
//!
//! This crate provides:
//! - Generating and loading the process-wide secret key
//! - Minting a token bound to one caller id
//! - Verifying a (caller id, token) pair
//!
//! ## Why stateless?
//!
//! A token is `HMAC-SHA256(secret, caller_id)`, so verification recomputes the
//! MAC instead of looking anything up:
//!
//! - **No token table**: nothing to store, expire or clean up
//! - **Caller-bound**: a token minted for one caller never verifies for another
//! - **Key-scoped**: rotating the secret key invalidates every outstanding token

pub mod error;
pub mod keys;
pub mod token;

pub use error::TokenError;
pub use keys::SecretKey;
pub use token::TokenAuthority;
