/// Utilities for parsing Datalog rules from failed token checks to extract
/// semantic information for better error messages.
use crate::error::TokenError;
use regex::Regex;
use std::sync::OnceLock;

/// Parse a failed check to extract specific error information
pub fn parse_check_failure(block_id: u32, check_id: u32, rule: &str) -> TokenError {
    // Try parsing as expiration check
    if let Some(error) = try_parse_expiration(block_id, check_id, rule) {
        return error;
    }

    // Try parsing as audience check
    if let Some(error) = try_parse_audience(block_id, check_id, rule) {
        return error;
    }

    // Try parsing as username check
    if let Some(error) = try_parse_username(block_id, check_id, rule) {
        return error;
    }

    // Fallback to generic check failed
    TokenError::CheckFailed {
        block_id,
        check_id,
        rule: rule.to_string(),
    }
}

/// Try to parse an expiration check failure
/// Pattern: "check if time($time), $time < TIMESTAMP"
fn try_parse_expiration(block_id: u32, check_id: u32, rule: &str) -> Option<TokenError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"check if time\(\$\w+\), \$\w+ < (\d+)").unwrap());

    if let Some(captures) = re.captures(rule) {
        if let Some(timestamp_str) = captures.get(1) {
            if let Ok(expired_at) = timestamp_str.as_str().parse::<i64>() {
                // The rule only carries the expiry; fill in the wall clock so
                // the error message can show both sides
                let current_time = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);

                return Some(TokenError::Expired {
                    expired_at,
                    current_time,
                    block_id,
                    check_id,
                });
            }
        }
    }

    None
}

/// Try to parse an audience check failure
/// Pattern: "check if audience("api.example.com")"
fn try_parse_audience(block_id: u32, check_id: u32, rule: &str) -> Option<TokenError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r#"check if audience\("([^"]+)"\)"#).unwrap());

    if let Some(captures) = re.captures(rule) {
        if let Some(audience_match) = captures.get(1) {
            let expected = audience_match.as_str().to_string();
            return Some(TokenError::AudienceMismatch {
                expected,
                provided: None,
                block_id,
                check_id,
            });
        }
    }

    None
}

/// Try to parse a username check failure
/// Pattern: "check if user("alice")"
fn try_parse_username(_block_id: u32, _check_id: u32, rule: &str) -> Option<TokenError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r#"check if user\("([^"]+)"\)"#).unwrap());

    if let Some(captures) = re.captures(rule) {
        if let Some(username_match) = captures.get(1) {
            let expected = username_match.as_str().to_string();
            // The token's actual username isn't in the rule; the verification
            // logic fills it in
            return Some(TokenError::UsernameMismatch {
                expected,
                actual: "<unknown>".to_string(),
            });
        }
    }

    None
}
