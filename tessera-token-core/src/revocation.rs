//! Revocation identifier extraction for session tokens
//!
//! Every signed block in a biscuit token carries a unique revocation
//! identifier. Tessera keys revocation stores on these identifiers, and the
//! authority block's identifier doubles as the session id in decoded
//! payloads.

use crate::Biscuit;
use crate::error::TokenError;
use std::fmt;

/// A revocation identifier for a single token block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationId {
    inner: Vec<u8>,
}

impl RevocationId {
    /// Create a new RevocationId from raw bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { inner: bytes }
    }

    /// Get the raw bytes of the revocation ID
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Convert the revocation ID to a hex string for display/storage
    pub fn to_hex(&self) -> String {
        hex::encode(&self.inner)
    }

    /// Create a RevocationId from a hex string, e.g. one read back from a
    /// revocation store
    pub fn from_hex(hex_str: &str) -> Result<Self, TokenError> {
        Ok(hex::decode(hex_str).map(Self::new)?)
    }
}

impl fmt::Display for RevocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Vec<u8>> for RevocationId {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Extract all revocation IDs from a token
///
/// Returns one ID per signed block, authority block first.
pub fn get_revocation_ids(biscuit: &Biscuit) -> Vec<RevocationId> {
    biscuit
        .revocation_identifiers()
        .into_iter()
        .map(RevocationId::from)
        .collect()
}

/// Get the revocation ID for the authority (first) block
///
/// For session tokens this is the identifier a revocation store keys on, and
/// the value surfaced as the payload's session id.
pub fn get_authority_revocation_id(biscuit: &Biscuit) -> Option<RevocationId> {
    biscuit
        .revocation_identifiers()
        .into_iter()
        .next()
        .map(RevocationId::from)
}

/// Get the revocation ID for a specific block by index
pub fn get_block_revocation_id(biscuit: &Biscuit, index: usize) -> Option<RevocationId> {
    biscuit
        .revocation_identifiers()
        .into_iter()
        .nth(index)
        .map(RevocationId::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;
    use biscuit_auth::macros::biscuit;

    fn session_biscuit(keypair: &KeyPair) -> Biscuit {
        biscuit!(
            r#"
                user("alice");
                issued_at(1735689600);
            "#
        )
        .build(keypair)
        .unwrap()
    }

    #[test]
    fn test_revocation_id_hex_conversion() {
        let bytes = vec![0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef];
        let rev_id = RevocationId::new(bytes.clone());

        assert_eq!(rev_id.to_hex(), "0123456789abcdef");
        assert_eq!(rev_id.to_string(), "0123456789abcdef");

        let from_hex = RevocationId::from_hex("0123456789abcdef").unwrap();
        assert_eq!(from_hex.as_bytes(), &bytes[..]);
        assert_eq!(rev_id, from_hex);
    }

    #[test]
    fn test_from_hex_rejects_invalid_input() {
        let result = RevocationId::from_hex("not hex at all");
        assert!(matches!(
            result,
            Err(TokenError::InvalidKeyFormat { .. })
        ));
    }

    #[test]
    fn test_get_revocation_ids() {
        let keypair = KeyPair::new();
        let biscuit = session_biscuit(&keypair);

        let rev_ids = get_revocation_ids(&biscuit);

        assert_eq!(rev_ids.len(), 1);
        assert!(!rev_ids[0].as_bytes().is_empty());
    }

    #[test]
    fn test_get_authority_revocation_id() {
        let keypair = KeyPair::new();
        let biscuit = session_biscuit(&keypair);

        let auth_id = get_authority_revocation_id(&biscuit);
        assert!(auth_id.is_some());

        let all_ids = get_revocation_ids(&biscuit);
        assert_eq!(auth_id.unwrap(), all_ids[0]);
        assert_eq!(get_block_revocation_id(&biscuit, 0), Some(all_ids[0].clone()));
        assert_eq!(get_block_revocation_id(&biscuit, 1), None);
    }

    #[test]
    fn test_identical_content_yields_distinct_ids() {
        let keypair = KeyPair::new();

        let rev_id1 = get_authority_revocation_id(&session_biscuit(&keypair)).unwrap();
        let rev_id2 = get_authority_revocation_id(&session_biscuit(&keypair)).unwrap();

        // Signatures differ between issuances, so the IDs do too
        assert_ne!(rev_id1, rev_id2);
    }
}
