extern crate biscuit_auth as biscuit;

use biscuit::Authorizer;
use biscuit::macros::{authorizer, check, fact};
use chrono::Utc;
use tessera_token_core::{
    PublicKey, TokenError, decode_token, get_authority_revocation_id, parse_check_failure,
};
use tracing::debug;

use crate::inspect::{extract_audience_from_content, extract_expiry_from_content};
use crate::payload::SessionPayload;

/// Builder for verifying session tokens with flexible configuration.
///
/// Verification always checks the signature chain and the expiry. A username
/// requirement and an audience context are optional.
///
/// # Example
/// ```rust
/// use tessera_session_token::{SessionGrant, SessionVerifier};
/// use tessera_token_core::{KeyPair, TokenTimeConfig};
///
/// # fn main() -> Result<(), tessera_token_core::TokenError> {
/// let keypair = KeyPair::new();
/// let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
///     .issue(&keypair)?;
///
/// // Bearer verification: any valid session token passes
/// let payload = SessionVerifier::new(token.clone(), keypair.public()).verify()?;
/// assert_eq!(payload.username, "alice");
///
/// // With a username requirement
/// SessionVerifier::new(token, keypair.public())
///     .with_username("alice".to_string())
///     .verify()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionVerifier {
    token: String,
    public_key: PublicKey,
    username: Option<String>,
    audience: Option<String>,
    verify_at: Option<i64>,
}

impl SessionVerifier {
    /// Creates a new session verifier for the given token and public key.
    pub fn new(token: String, public_key: PublicKey) -> Self {
        Self {
            token,
            public_key,
            username: None,
            audience: None,
            verify_at: None,
        }
    }

    /// Requires the token to belong to a specific username.
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Supplies the audience context the token is being presented to.
    ///
    /// Audience-restricted tokens fail verification unless a matching
    /// audience is supplied here.
    pub fn with_audience(mut self, audience: String) -> Self {
        self.audience = Some(audience);
        self
    }

    /// Verifies against an explicit time instead of the wall clock.
    ///
    /// The verifier-side counterpart of `TokenTimeConfig::start_time` on the
    /// mint side, for deterministic checks.
    pub fn at_time(mut self, unix_timestamp: i64) -> Self {
        self.verify_at = Some(unix_timestamp);
        self
    }

    /// Performs the token verification with the configured parameters.
    ///
    /// # Returns
    /// * `Ok(SessionPayload)` - The decoded claims when the token is valid
    /// * `Err(TokenError)` - If verification fails for any reason
    pub fn verify(self) -> Result<SessionPayload, TokenError> {
        let biscuit = decode_token(&self.token, self.public_key)?;
        let now = self.verify_at.unwrap_or_else(|| Utc::now().timestamp());

        let expected_audience = self.audience.clone();

        // The policy requires a user fact, so non-session biscuits are
        // rejected even when every check passes
        let mut authz = authorizer!(
            r#"
                time({now});
                allow if user($u);
            "#
        );

        if let Some(username) = self.username {
            authz = authz.check(check!(r#"check if user({username});"#))?;
        }

        if let Some(audience) = self.audience {
            authz = authz.fact(fact!(r#"audience({audience});"#))?;
        }

        let mut authz = authz
            .build(&biscuit)
            .map_err(|e| TokenError::internal(format!("Failed to build authorizer: {e}")))?;

        let token_username = query_username(&mut authz);

        if let Err(e) = authz.authorize() {
            debug!("session token rejected: {e}");
            return Err(convert_session_error(
                e,
                token_username.ok(),
                expected_audience,
            ));
        }

        let username = token_username?;

        let issued: Vec<(i64,)> = authz
            .query("data($t) <- issued_at($t)")
            .map_err(|e| TokenError::internal(format!("Failed to query issued_at: {e}")))?;
        let issued_at = issued
            .first()
            .map(|(t,)| *t)
            .ok_or_else(|| TokenError::internal("No issued_at fact found in token".to_string()))?;

        let content = biscuit.print();
        let expires_at = extract_expiry_from_content(&content)
            .ok_or_else(|| TokenError::internal("No expiry check found in token".to_string()))?;
        let audience = extract_audience_from_content(&content);

        let session_id = get_authority_revocation_id(&biscuit)
            .ok_or_else(|| TokenError::internal("Token has no revocation identifiers".to_string()))?
            .to_hex();

        Ok(SessionPayload {
            session_id,
            username,
            issued_at,
            expires_at,
            audience,
        })
    }
}

/// Verifies a session token as a bearer credential and returns its payload.
///
/// Convenience wrapper around [`SessionVerifier`] with no username or
/// audience requirements.
pub fn verify_session_token(
    token: String,
    public_key: PublicKey,
) -> Result<SessionPayload, TokenError> {
    SessionVerifier::new(token, public_key).verify()
}

fn query_username(authz: &mut Authorizer) -> Result<String, TokenError> {
    let users: Vec<(String,)> = authz
        .query("data($name) <- user($name)")
        .map_err(|e| TokenError::internal(format!("Failed to query user fact: {e}")))?;

    users
        .first()
        .map(|(name,)| name.clone())
        .ok_or_else(|| TokenError::internal("No user fact found in token".to_string()))
}

/// Convert biscuit authorization errors to semantic session errors
fn convert_session_error(
    err: biscuit::error::Token,
    token_username: Option<String>,
    expected_audience: Option<String>,
) -> TokenError {
    use biscuit::error::{Logic, Token};

    match err {
        Token::FailedLogic(logic_err) => match &logic_err {
            Logic::Unauthorized { checks, .. } | Logic::NoMatchingPolicy { checks } => {
                for failed_check in checks.iter() {
                    let (block_id, check_id, rule) = match failed_check {
                        biscuit::error::FailedCheck::Block(block_check) => (
                            block_check.block_id,
                            block_check.check_id,
                            block_check.rule.clone(),
                        ),
                        biscuit::error::FailedCheck::Authorizer(auth_check) => {
                            (0, auth_check.check_id, auth_check.rule.clone())
                        }
                    };

                    let parsed_error = parse_check_failure(block_id, check_id, &rule);

                    match parsed_error {
                        TokenError::Expired { .. } | TokenError::CheckFailed { .. } => {
                            return parsed_error;
                        }
                        TokenError::AudienceMismatch {
                            expected,
                            block_id,
                            check_id,
                            ..
                        } => {
                            return TokenError::AudienceMismatch {
                                expected,
                                provided: expected_audience,
                                block_id,
                                check_id,
                            };
                        }
                        TokenError::UsernameMismatch { expected, .. } => {
                            return TokenError::UsernameMismatch {
                                expected,
                                actual: token_username
                                    .unwrap_or_else(|| "<unknown>".to_string()),
                            };
                        }
                        _ => continue,
                    }
                }

                TokenError::from(Token::FailedLogic(logic_err))
            }
            other => TokenError::from(Token::FailedLogic(other.clone())),
        },
        other => TokenError::from(other),
    }
}
