//! Token and key plumbing shared by the Tessera crates

use biscuit_auth::{Algorithm, Biscuit, KeyPair, PrivateKey, PublicKey};

use crate::error::TokenError;

/// Serializes a biscuit token to its base64 wire form.
pub fn encode_token(biscuit: &Biscuit) -> Result<String, TokenError> {
    Ok(biscuit.to_base64()?)
}

/// Decodes a base64 token and verifies its signature chain against the
/// issuer's public key.
pub fn decode_token(token: &str, public_key: PublicKey) -> Result<Biscuit, TokenError> {
    Ok(Biscuit::from_base64(token, public_key)?)
}

/// Parses a token from raw bytes and verifies its signature chain against the
/// issuer's public key.
pub fn parse_token(bytes: &[u8], public_key: PublicKey) -> Result<Biscuit, TokenError> {
    Ok(Biscuit::from(bytes, public_key)?)
}

/// Takes a public key encoded as a string in the format "ed25519/..." or
/// "secp256r1/..." and returns a PublicKey.
pub fn public_key_from_string(key: &str) -> Result<PublicKey, TokenError> {
    let (alg, key_bytes) = split_key_string(key)?;

    let key = PublicKey::from_bytes(&key_bytes, alg)
        .map_err(|e| TokenError::invalid_key_format(e.to_string()))?;

    Ok(key)
}

/// Takes a private key encoded as a string in the format "ed25519/..." or
/// "secp256r1/..." and returns the signing KeyPair.
pub fn keypair_from_string(key: &str) -> Result<KeyPair, TokenError> {
    let (alg, key_bytes) = split_key_string(key)?;

    let private_key = PrivateKey::from_bytes(&key_bytes, alg)
        .map_err(|e| TokenError::invalid_key_format(e.to_string()))?;

    Ok(KeyPair::from(&private_key))
}

fn split_key_string(key: &str) -> Result<(Algorithm, Vec<u8>), TokenError> {
    let parts = key.split('/').collect::<Vec<&str>>();
    if parts.len() != 2 {
        return Err(TokenError::invalid_key_format(
            "Key must be in format 'algorithm/hexkey'",
        ));
    }

    let alg = match parts[0] {
        "ed25519" => Algorithm::Ed25519,
        "secp256r1" => Algorithm::Secp256r1,
        _ => {
            return Err(TokenError::invalid_key_format(
                "Unsupported algorithm, must be ed25519 or secp256r1",
            ));
        }
    };

    let key_bytes = hex::decode(parts[1])?;

    Ok((alg, key_bytes))
}
