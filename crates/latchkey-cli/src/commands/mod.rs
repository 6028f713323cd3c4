//! CLI command implementations for the Latchkey server.

pub mod keys;
pub mod serve;
pub mod token;
