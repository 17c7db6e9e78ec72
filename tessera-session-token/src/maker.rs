//! The two-operation session token contract

use std::time::Duration;
use tessera_token_core::{KeyPair, PublicKey, TokenError, TokenTimeConfig, keypair_from_string};

use crate::mint::SessionGrant;
use crate::payload::SessionPayload;
use crate::verify::SessionVerifier;

/// Contract for managing session tokens.
///
/// Anything that can issue a credential for a username and later check it
/// satisfies this trait; services that only need create/verify can depend on
/// `dyn SessionMaker` instead of a concrete key-holding type.
pub trait SessionMaker {
    /// Creates a new token for a specific username and validity duration
    fn create_token(&self, username: &str, duration: Duration) -> Result<String, TokenError>;

    /// Checks that a token is valid and returns its decoded payload
    fn verify_token(&self, token: &str) -> Result<SessionPayload, TokenError>;
}

/// Session maker backed by a locally held Ed25519 keypair.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tessera_session_token::{KeypairMaker, SessionMaker};
///
/// let maker = KeypairMaker::new();
/// let token = maker
///     .create_token("alice", Duration::from_secs(900))
///     .expect("Failed to create token");
///
/// let payload = maker.verify_token(&token).expect("Failed to verify token");
/// assert_eq!(payload.username, "alice");
/// ```
pub struct KeypairMaker {
    keypair: KeyPair,
    audience: Option<String>,
}

impl KeypairMaker {
    /// Creates a maker with a freshly generated keypair.
    pub fn new() -> Self {
        Self {
            keypair: KeyPair::new(),
            audience: None,
        }
    }

    /// Creates a maker from a private key string in the format
    /// "ed25519/..." or "secp256r1/...".
    pub fn from_key_string(key: &str) -> Result<Self, TokenError> {
        Ok(Self {
            keypair: keypair_from_string(key)?,
            audience: None,
        })
    }

    /// Restricts every issued token to the given audience, and supplies the
    /// same audience when verifying.
    pub fn with_audience(mut self, audience: String) -> Self {
        self.audience = Some(audience);
        self
    }

    /// The public key tokens from this maker verify against.
    ///
    /// Hand this to services that verify tokens without holding the signing
    /// key, e.g. through [`SessionVerifier`].
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public()
    }
}

impl Default for KeypairMaker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMaker for KeypairMaker {
    fn create_token(&self, username: &str, duration: Duration) -> Result<String, TokenError> {
        let time_config = TokenTimeConfig::with_duration(duration.as_secs() as i64);

        let mut grant = SessionGrant::new(username.to_string(), time_config);
        if let Some(audience) = self.audience.clone() {
            grant = grant.audience_restricted(audience);
        }

        grant.issue(&self.keypair)
    }

    fn verify_token(&self, token: &str) -> Result<SessionPayload, TokenError> {
        let mut verifier = SessionVerifier::new(token.to_string(), self.keypair.public());
        if let Some(audience) = self.audience.clone() {
            verifier = verifier.with_audience(audience);
        }

        verifier.verify()
    }
}
