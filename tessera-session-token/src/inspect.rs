extern crate biscuit_auth as biscuit;
use biscuit::macros::authorizer;
use chrono::Utc;
use tessera_token_core::{PublicKey, TokenError, decode_token};

/// Result of inspecting a session token
#[derive(Debug, Clone)]
pub struct InspectResult {
    /// The username the session belongs to
    pub username: String,
    /// Unix timestamp the token was issued at (if extractable)
    pub issued_at: Option<i64>,
    /// Unix timestamp when the token expires (if extractable)
    pub expiry: Option<i64>,
    /// Whether the token is currently expired
    pub is_expired: bool,
    /// Audience restriction (if present)
    pub audience: Option<String>,
    /// Session id of the token this one was refreshed from (if any)
    pub refreshed_from: Option<String>,
}

/// Inspects a session token to extract its claims without running
/// authorization checks.
///
/// The signature chain is still verified against the public key; only the
/// expiry/username/audience checks are skipped. Use this to look inside a
/// token that may already be expired.
pub fn inspect_session_token(
    token: String,
    public_key: PublicKey,
) -> Result<InspectResult, TokenError> {
    let biscuit = decode_token(&token, public_key)?;
    let now = Utc::now().timestamp();

    let authorizer = authorizer!(
        r#"
            time({now});
            allow if true;
        "#
    );

    let mut authorizer = authorizer
        .build(&biscuit)
        .map_err(|e| TokenError::internal(format!("Failed to build authorizer: {e}")))?;

    let users: Vec<(String,)> = authorizer
        .query("data($name) <- user($name)")
        .map_err(|e| TokenError::internal(format!("Failed to query user fact: {e}")))?;

    let username = users
        .first()
        .map(|(name,)| name.clone())
        .ok_or_else(|| TokenError::internal("No user fact found in token".to_string()))?;

    let issued: Vec<(i64,)> = authorizer
        .query("data($t) <- issued_at($t)")
        .map_err(|e| TokenError::internal(format!("Failed to query issued_at: {e}")))?;
    let issued_at = issued.first().map(|(t,)| *t);

    let parents: Vec<(String,)> = authorizer
        .query("data($p) <- refreshed_from($p)")
        .map_err(|e| TokenError::internal(format!("Failed to query refresh lineage: {e}")))?;
    let refreshed_from = parents.first().map(|(p,)| p.clone());

    let content = biscuit.print();
    let expiry = extract_expiry_from_content(&content);
    let audience = extract_audience_from_content(&content);

    let is_expired = expiry.is_some_and(|exp| exp <= now);

    Ok(InspectResult {
        username,
        issued_at,
        expiry,
        is_expired,
        audience,
        refreshed_from,
    })
}

/// Extracts the expiry timestamp from token content
///
/// Scans the printed checks for `$time < TIMESTAMP` and keeps the earliest
/// bound in case a token carries more than one time check.
pub(crate) fn extract_expiry_from_content(content: &str) -> Option<i64> {
    let mut earliest_expiry: Option<i64> = None;

    for line in content.lines() {
        if line.contains("check if") && line.contains("time") && line.contains("<") {
            if let Some(pos) = line.find("$time <") {
                let after_lt = &line[pos + 8..].trim();
                let number_str = after_lt
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == '-')
                    .collect::<String>();

                if let Ok(timestamp) = number_str.parse::<i64>() {
                    earliest_expiry = Some(earliest_expiry.map_or(timestamp, |e| e.min(timestamp)));
                }
            }
        }
    }

    earliest_expiry
}

/// Extracts the audience restriction from token content
pub(crate) fn extract_audience_from_content(content: &str) -> Option<String> {
    for line in content.lines() {
        if line.contains("check if") && line.contains("audience(") {
            if let Some(start_pos) = line.find("audience(") {
                let after_audience = &line[start_pos + 9..];

                if let Some(end_pos) = after_audience.find(')') {
                    let audience_str = &after_audience[..end_pos].trim();
                    let audience = audience_str.trim_matches('"').trim_matches('\'');

                    if !audience.is_empty() {
                        return Some(audience.to_string());
                    }
                }
            }
        }
    }

    None
}
