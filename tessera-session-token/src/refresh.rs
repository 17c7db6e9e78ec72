use tessera_token_core::{KeyPair, TokenError, TokenTimeConfig};
use tracing::debug;

use crate::inspect::inspect_session_token;
use crate::mint::SessionGrant;
use crate::verify::SessionVerifier;

/// Re-issues a still-valid session token with a fresh validity window.
///
/// The presented token must pass full verification against the issuing
/// keypair first; an expired, tampered, or foreign token is refused with
/// [`TokenError::RefreshDenied`]. The replacement token keeps the username
/// and any audience restriction, gets a new session id, and records the old
/// session id in a `refreshed_from` fact so a revocation store can follow
/// the lineage.
///
/// Appending a block to the old token cannot do this: appended time checks
/// only tighten a validity window, never extend it. Extending a session
/// means minting a new token.
pub fn refresh_session_token(
    token: String,
    keypair: &KeyPair,
    time_config: TokenTimeConfig,
) -> Result<String, TokenError> {
    let public_key = keypair.public();

    // Audience-restricted tokens only verify with their audience supplied,
    // so look inside the token before running the checks.
    let info = inspect_session_token(token.clone(), public_key).map_err(|e| {
        TokenError::RefreshDenied {
            reason: format!("presented token could not be read: {e}"),
        }
    })?;

    let mut verifier = SessionVerifier::new(token, public_key);
    if let Some(audience) = info.audience.clone() {
        verifier = verifier.with_audience(audience);
    }

    let payload = verifier.verify().map_err(|e| TokenError::RefreshDenied {
        reason: format!("presented token failed verification: {e}"),
    })?;

    debug!(
        "refreshing session {} for user {}",
        payload.session_id, payload.username
    );

    let mut grant =
        SessionGrant::new(payload.username, time_config).refreshed_from(payload.session_id);
    if let Some(audience) = payload.audience {
        grant = grant.audience_restricted(audience);
    }

    grant.issue(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::verify_session_token;

    #[test]
    fn test_refresh_valid_token() {
        let keypair = KeyPair::new();

        let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
            .issue(&keypair)
            .expect("Failed to issue token");
        let original = verify_session_token(token.clone(), keypair.public()).unwrap();

        let refreshed = refresh_session_token(token, &keypair, TokenTimeConfig::default())
            .expect("Failed to refresh token");

        let payload = verify_session_token(refreshed.clone(), keypair.public())
            .expect("Refreshed token should verify");

        assert_eq!(payload.username, "alice");
        assert_ne!(payload.session_id, original.session_id);

        let info = inspect_session_token(refreshed, keypair.public()).unwrap();
        assert_eq!(info.refreshed_from, Some(original.session_id));
    }

    #[test]
    fn test_refresh_extends_expiry() {
        let keypair = KeyPair::new();
        let short_config = TokenTimeConfig {
            start_time: None,
            duration: 60,
        };

        let token = SessionGrant::new("alice".to_string(), short_config)
            .issue(&keypair)
            .unwrap();
        let original = verify_session_token(token.clone(), keypair.public()).unwrap();

        let refreshed =
            refresh_session_token(token, &keypair, TokenTimeConfig::with_duration(3600))
                .expect("Failed to refresh token");
        let payload = verify_session_token(refreshed, keypair.public()).unwrap();

        assert!(payload.expires_at > original.expires_at);
    }

    #[test]
    fn test_refresh_rejects_expired_token() {
        let keypair = KeyPair::new();
        let expired_config = TokenTimeConfig {
            start_time: Some(0),
            duration: 1,
        };

        let token = SessionGrant::new("alice".to_string(), expired_config)
            .issue(&keypair)
            .unwrap();

        let result = refresh_session_token(token, &keypair, TokenTimeConfig::default());

        assert!(matches!(result, Err(TokenError::RefreshDenied { .. })));
    }

    #[test]
    fn test_refresh_rejects_foreign_token() {
        let keypair = KeyPair::new();
        let other = KeyPair::new();

        let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
            .issue(&other)
            .unwrap();

        let result = refresh_session_token(token, &keypair, TokenTimeConfig::default());

        assert!(matches!(result, Err(TokenError::RefreshDenied { .. })));
    }

    #[test]
    fn test_refresh_preserves_audience() {
        let keypair = KeyPair::new();

        let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
            .audience_restricted("api.example.com".to_string())
            .issue(&keypair)
            .unwrap();

        let refreshed = refresh_session_token(token, &keypair, TokenTimeConfig::default())
            .expect("Failed to refresh audience-restricted token");

        // Still audience-restricted: bearer verification without the
        // audience context must fail
        assert!(verify_session_token(refreshed.clone(), keypair.public()).is_err());

        let payload = SessionVerifier::new(refreshed, keypair.public())
            .with_audience("api.example.com".to_string())
            .verify()
            .expect("Refreshed token should verify with its audience");
        assert_eq!(payload.audience, Some("api.example.com".to_string()));
    }

    #[test]
    fn test_refresh_chain_records_immediate_parent() {
        let keypair = KeyPair::new();

        let first = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
            .issue(&keypair)
            .unwrap();
        let first_id = verify_session_token(first.clone(), keypair.public())
            .unwrap()
            .session_id;

        let second = refresh_session_token(first, &keypair, TokenTimeConfig::default()).unwrap();
        let second_id = verify_session_token(second.clone(), keypair.public())
            .unwrap()
            .session_id;

        let third = refresh_session_token(second, &keypair, TokenTimeConfig::default()).unwrap();

        let info = inspect_session_token(third, keypair.public()).unwrap();
        assert_eq!(info.refreshed_from, Some(second_id.clone()));
        assert_ne!(second_id, first_id);
    }
}
