extern crate biscuit_auth as biscuit;

use biscuit::macros::{biscuit, check, fact};
use chrono::Utc;
use tessera_token_core::{KeyPair, TokenError, TokenTimeConfig, encode_token};
use tracing::debug;

/// Builder for issuing session tokens with flexible configuration.
///
/// # Authority block
///
/// ```datalog
/// user(username);
/// issued_at(timestamp);
/// check if time($time), $time < expiration;
/// ```
///
/// An audience restriction adds `check if audience(audience)`, and a
/// refreshed token additionally carries a `refreshed_from(parent_session_id)`
/// fact recording its lineage.
///
/// # Example
/// ```rust
/// use tessera_session_token::SessionGrant;
/// use tessera_token_core::{KeyPair, TokenTimeConfig};
///
/// let keypair = KeyPair::new();
///
/// // Basic session token
/// let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
///     .issue(&keypair)
///     .expect("Failed to issue token");
///
/// // Audience-restricted session token
/// let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
///     .audience_restricted("api.example.com".to_string())
///     .issue(&keypair)
///     .expect("Failed to issue token");
/// ```
pub struct SessionGrant {
    username: String,
    time_config: TokenTimeConfig,
    audience: Option<String>,
    refreshed_from: Option<String>,
}

impl SessionGrant {
    /// Creates a new session grant builder.
    ///
    /// # Arguments
    /// * `username` - The principal the session belongs to
    /// * `time_config` - Time configuration for token validity
    pub fn new(username: String, time_config: TokenTimeConfig) -> Self {
        Self {
            username,
            time_config,
            audience: None,
            refreshed_from: None,
        }
    }

    /// Restricts the session to a specific audience.
    ///
    /// Adds an audience restriction check to the authority block:
    /// - `check if audience({audience})`
    ///
    /// The token then only verifies when the verifier supplies a matching
    /// audience fact.
    ///
    /// # Arguments
    /// * `audience` - The audience to restrict to (e.g., "api.example.com")
    pub fn audience_restricted(mut self, audience: String) -> Self {
        self.audience = Some(audience);
        self
    }

    /// Records the session this token was refreshed from.
    ///
    /// Adds a `refreshed_from({parent_session_id})` fact to the authority
    /// block so revocation stores can follow the lineage.
    pub fn refreshed_from(mut self, parent_session_id: String) -> Self {
        self.refreshed_from = Some(parent_session_id);
        self
    }

    /// Issues (builds and signs) the session token.
    ///
    /// # Arguments
    /// * `keypair` - The keypair to sign the token with
    ///
    /// # Returns
    /// Base64-encoded biscuit token
    pub fn issue(self, keypair: &KeyPair) -> Result<String, TokenError> {
        let (issued_at, expiration) = self.time_config.window_from(Utc::now().timestamp());

        // Extract self fields for use in macro (macro doesn't support self.field directly)
        let username = self.username;
        let audience = self.audience;
        let refreshed_from = self.refreshed_from;

        let mut biscuit_builder = biscuit!(
            r#"
                user({username});
                issued_at({issued_at});
                check if time($time), $time < {expiration};
            "#
        );

        // Add audience restriction if specified
        if let Some(audience) = audience {
            biscuit_builder = biscuit_builder.check(check!(
                r#"
                    check if audience({audience});
                "#
            ))?;
        }

        // Record refresh lineage if this token replaces an earlier session
        if let Some(parent) = refreshed_from {
            biscuit_builder = biscuit_builder.fact(fact!(r#"refreshed_from({parent});"#))?;
        }

        // Build and sign the biscuit
        let biscuit = biscuit_builder.build(keypair)?;
        debug!("session token (authority): {}", biscuit);
        encode_token(&biscuit)
    }
}

/// Issues a session token for `username` valid for the configured window.
///
/// Convenience wrapper around [`SessionGrant`] for the common case with no
/// audience restriction.
pub fn create_session_token(
    username: String,
    keypair: &KeyPair,
    time_config: TokenTimeConfig,
) -> Result<String, TokenError> {
    SessionGrant::new(username, time_config).issue(keypair)
}
