//! # Tessera Session Token
//!
//! Session token implementation for username-based authentication.
//!
//! This crate issues and verifies opaque session credentials (biscuit
//! tokens). A session token ties a username to a validity window and is
//! verified statelessly against the issuer's public key.
//!
//! ## Authority Block
//!
//! ```datalog
//! user(username);
//! issued_at(timestamp);
//! check if time($time), $time < expiration;
//! ```
//!
//! Audience-restricted tokens additionally carry
//! `check if audience(audience)`, and refreshed tokens record their parent
//! session in a `refreshed_from` fact.
//!
//! ## Example
//!
//! ```rust
//! use tessera_session_token::{SessionGrant, SessionVerifier};
//! use tessera_token_core::{KeyPair, TokenTimeConfig};
//!
//! let keypair = KeyPair::new();
//!
//! // Issue a session token for a user
//! let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
//!     .issue(&keypair)
//!     .expect("Failed to issue session token");
//!
//! // Verify it and recover the claims
//! let payload = SessionVerifier::new(token, keypair.public())
//!     .with_username("alice".to_string())
//!     .verify()
//!     .expect("Failed to verify session token");
//!
//! assert_eq!(payload.username, "alice");
//! ```

mod inspect;
mod maker;
mod mint;
mod payload;
mod refresh;
mod revocation;
mod verify;

pub use inspect::{InspectResult, inspect_session_token};
pub use maker::{KeypairMaker, SessionMaker};
pub use mint::{SessionGrant, create_session_token};
pub use payload::SessionPayload;
pub use refresh::refresh_session_token;
pub use revocation::{SessionRevocation, get_session_revocation, get_session_revocation_ids};
pub use verify::{SessionVerifier, verify_session_token};

// Re-export commonly needed types from core
pub use tessera_token_core::{
    Biscuit, KeyPair, PrivateKey, PublicKey, TokenError, TokenTimeConfig, decode_token,
    encode_token, keypair_from_string, parse_token, public_key_from_string,
};
