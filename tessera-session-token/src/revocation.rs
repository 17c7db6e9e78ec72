//! Revocation hooks for session tokens

use crate::inspect::inspect_session_token;
use std::fmt;
use tessera_token_core::{
    PublicKey, RevocationId, TokenError, decode_token, get_authority_revocation_id,
    get_revocation_ids,
};

/// A session and the identifiers a revocation store needs for it
#[derive(Debug, Clone)]
pub struct SessionRevocation {
    /// The username the session belongs to
    pub username: String,
    /// The revocation ID of the session token itself
    pub revocation_id: RevocationId,
    /// Session id of the token this one was refreshed from (if any).
    /// Revoking a session should usually revoke its lineage too, otherwise a
    /// stolen pre-refresh token stays usable.
    pub parent_session: Option<String>,
}

impl fmt::Display for SessionRevocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "username: {}, revocation_id: {}, parent: {}",
            self.username,
            self.revocation_id.to_hex(),
            self.parent_session.as_deref().unwrap_or("<none>")
        )
    }
}

/// Get the revocation record for a session token
pub fn get_session_revocation(
    token: String,
    public_key: PublicKey,
) -> Result<SessionRevocation, TokenError> {
    let biscuit = decode_token(&token, public_key)?;

    let revocation_id = get_authority_revocation_id(&biscuit)
        .ok_or_else(|| TokenError::internal("Token has no revocation identifiers".to_string()))?;

    let info = inspect_session_token(token, public_key)?;

    Ok(SessionRevocation {
        username: info.username,
        revocation_id,
        parent_session: info.refreshed_from,
    })
}

/// Get every revocation ID carried by a session token, one per signed block
///
/// A rejection store should match a presented token against all of these.
pub fn get_session_revocation_ids(
    token: String,
    public_key: PublicKey,
) -> Result<Vec<RevocationId>, TokenError> {
    let biscuit = decode_token(&token, public_key)?;
    Ok(get_revocation_ids(&biscuit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mint::SessionGrant;
    use crate::refresh::refresh_session_token;
    use tessera_token_core::{KeyPair, TokenTimeConfig};

    #[test]
    fn test_get_session_revocation() {
        let keypair = KeyPair::new();

        let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
            .issue(&keypair)
            .expect("Failed to issue token");

        let revocation = get_session_revocation(token, keypair.public())
            .expect("Failed to get session revocation");

        assert_eq!(revocation.username, "alice");
        assert!(!revocation.revocation_id.to_hex().is_empty());
        assert_eq!(revocation.parent_session, None);
    }

    #[test]
    fn test_revocation_matches_payload_session_id() {
        let keypair = KeyPair::new();

        let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
            .issue(&keypair)
            .unwrap();

        let payload =
            crate::verify::verify_session_token(token.clone(), keypair.public()).unwrap();
        let revocation = get_session_revocation(token, keypair.public()).unwrap();

        // Revoking by payload session id must hit the token's revocation id
        assert_eq!(payload.session_id, revocation.revocation_id.to_hex());
    }

    #[test]
    fn test_refreshed_token_carries_parent_session() {
        let keypair = KeyPair::new();

        let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
            .issue(&keypair)
            .unwrap();
        let original = get_session_revocation(token.clone(), keypair.public()).unwrap();

        let refreshed =
            refresh_session_token(token, &keypair, TokenTimeConfig::default()).unwrap();
        let revocation = get_session_revocation(refreshed, keypair.public()).unwrap();

        assert_eq!(
            revocation.parent_session,
            Some(original.revocation_id.to_hex())
        );
        assert_ne!(
            revocation.revocation_id.to_hex(),
            original.revocation_id.to_hex()
        );
    }

    #[test]
    fn test_get_session_revocation_ids() {
        let keypair = KeyPair::new();

        let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
            .issue(&keypair)
            .unwrap();

        let ids = get_session_revocation_ids(token, keypair.public()).unwrap();

        // Session tokens are single-block
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_display_format() {
        let keypair = KeyPair::new();

        let token = SessionGrant::new("alice".to_string(), TokenTimeConfig::default())
            .issue(&keypair)
            .unwrap();

        let revocation = get_session_revocation(token, keypair.public()).unwrap();
        let rendered = revocation.to_string();

        assert!(rendered.starts_with("username: alice, revocation_id: "));
        assert!(rendered.ends_with("parent: <none>"));
    }
}
