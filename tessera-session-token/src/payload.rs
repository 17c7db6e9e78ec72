use serde::{Deserialize, Serialize};

/// Decoded claims recovered from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// Unique id of this session. This is the hex revocation identifier of
    /// the token's authority block, so it is also the value a revocation
    /// store keys on.
    pub session_id: String,
    /// The principal the session belongs to
    pub username: String,
    /// Unix timestamp the token was issued at
    pub issued_at: i64,
    /// Unix timestamp the token stops being valid at
    pub expires_at: i64,
    /// Audience restriction carried by the token, if any
    pub audience: Option<String>,
}

impl SessionPayload {
    /// Whether the session is still inside its validity window at `now`.
    ///
    /// The expiry instant itself is outside the window, matching the token's
    /// `$time < expiration` check.
    pub fn valid_at(&self, now: i64) -> bool {
        now < self.expires_at
    }
}
