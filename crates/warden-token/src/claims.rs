//! Signed session token payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Standard subject; mirrors `user_id`.
    pub sub: String,

    #[serde(rename = "UserID")]
    pub user_id: String,

    /// Raw role value. Validated on parse rather than on deserialization so an
    /// out-of-range role is reported as an unknown token, not a malformed one.
    #[serde(rename = "UserType")]
    pub user_type: i32,

    /// Non-zero marks a token minted for another platform or purpose.
    #[serde(rename = "PlatformID", default)]
    pub platform_id: i32,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Expiration (Unix seconds).
    pub exp: i64,

    /// Not before (Unix seconds).
    pub nbf: i64,
}

impl SessionClaims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.nbf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn claims() -> SessionClaims {
        SessionClaims {
            sub: "u1".into(),
            user_id: "u1".into(),
            user_type: 1,
            platform_id: 0,
            iat: 1_000,
            exp: 2_000,
            nbf: 940,
        }
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(claims()).unwrap();
        assert_eq!(json["UserID"], "u1");
        assert_eq!(json["UserType"], 1);
        assert_eq!(json["PlatformID"], 0);
        assert_eq!(json["nbf"], 940);
    }

    #[test]
    fn test_validity_window() {
        let c = claims();
        let at = |s| Utc.timestamp_opt(s, 0).unwrap();
        assert!(!c.is_active_at(at(939)));
        assert!(c.is_active_at(at(940)));
        assert!(!c.is_expired_at(at(1_999)));
        assert!(c.is_expired_at(at(2_000)));
    }
}
