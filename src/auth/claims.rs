/// Access Token Claim-Set
///
/// The structured data embedded in a signed bearer token: subject (username),
/// role, and standard JWT claims (RFC 7519).

use serde::{Deserialize, Serialize};

use crate::store::Role;

/// Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Role at issuance time; authorization re-checks the live record
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create new claims with expiry = now + `ttl_seconds`.
    pub fn new(username: String, role: Role, ttl_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: username,
            role,
            exp: now + ttl_seconds,
            iat: now,
            iss: issuer,
        }
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("alice".to_string(), Role::User, 3600, "test".to_string());

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iss, "test");
        assert_eq!(claims.exp, claims.iat + 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let claims = Claims::new("alice".to_string(), Role::User, 0, "test".to_string());
        assert!(claims.is_expired());
    }

    #[test]
    fn test_role_round_trips_through_json() {
        let claims = Claims::new("mod".to_string(), Role::Moderator, 60, "test".to_string());
        let json = serde_json::to_string(&claims).unwrap();
        let parsed: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.role, Role::Moderator);
        assert_eq!(parsed.sub, "mod");
    }
}
