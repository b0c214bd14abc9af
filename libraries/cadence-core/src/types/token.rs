/// Bearer tokens handed to the playback device
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// An access token and the instant it stops being valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,

    /// Expiry as milliseconds since the Unix epoch
    pub expires_at_ms: i64,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at_ms: i64) -> Self {
        Self {
            value: value.into(),
            expires_at_ms,
        }
    }

    /// Token valid for `expires_in_secs` from now
    pub fn expiring_in(value: impl Into<String>, expires_in_secs: i64) -> Self {
        Self::new(value, Utc::now().timestamp_millis() + expires_in_secs * 1000)
    }

    /// Whether the token is expired at `now_ms`
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Whether the token is expired right now
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary_counts_as_expired() {
        let token = AccessToken::new("t", 1_000);
        assert!(!token.is_expired_at(999));
        assert!(token.is_expired_at(1_000));
    }

    #[test]
    fn fresh_token_is_valid() {
        assert!(!AccessToken::expiring_in("t", 3600).is_expired());
        assert!(AccessToken::expiring_in("t", -1).is_expired());
    }
}
