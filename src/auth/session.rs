use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Bearer credential returned by the IMS token exchange.
///
/// Tokens carry no usable expiry here; callers re-authenticate when a
/// request comes back 401.
#[derive(Clone)]
pub struct SessionData {
    pub access_token: String,
    pub acquired_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            acquired_at: Utc::now(),
        }
    }

    /// How long ago the token was acquired (for diagnostics)
    pub fn age(&self) -> Duration {
        Utc::now() - self.acquired_at
    }
}

// Manual Debug so the token never lands in logs
impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("access_token", &"<redacted>")
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = SessionData::new("super-secret-token".to_string());
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_age_is_non_negative() {
        let session = SessionData::new("t".to_string());
        assert!(session.age() >= Duration::zero());
    }
}
