//! # Tessera Token Core
//!
//! Core utilities and types shared across Tessera session token crates.
//!
//! This crate provides the common pieces used by the session token
//! implementation, including:
//!
//! - Token encoding/decoding utilities
//! - Time configuration for token validity
//! - Common error types
//! - Revocation identifier extraction
//! - Biscuit type re-exports

pub mod error;
pub mod revocation;
pub mod rule_parser;
pub mod time;
pub mod utils;

pub use error::{CheckFailure, TokenError};
pub use revocation::{
    RevocationId, get_authority_revocation_id, get_block_revocation_id, get_revocation_ids,
};
pub use rule_parser::parse_check_failure;
pub use time::TokenTimeConfig;
pub use utils::{
    decode_token, encode_token, keypair_from_string, parse_token, public_key_from_string,
};

// Re-export biscuit types that are needed for public API
pub use biscuit_auth::{Algorithm, Biscuit, KeyPair, PrivateKey, PublicKey};
