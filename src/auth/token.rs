/// Token Service
///
/// Issues and validates signed access tokens and owns the revocation set.
/// Claims are self-contained: validation never touches the database. The
/// guard re-resolves the live user record on top of this.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::auth::revocation::RevocationList;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::store::Role;

/// Shared token issuance/validation service. Cloning shares the revocation
/// set, so every worker sees the same blacklist.
#[derive(Clone)]
pub struct TokenService {
    settings: JwtSettings,
    revoked: RevocationList,
}

impl TokenService {
    pub fn new(settings: JwtSettings) -> Self {
        Self {
            settings,
            revoked: RevocationList::new(),
        }
    }

    /// Issue a signed bearer token with the configured TTL.
    pub fn issue(&self, username: &str, role: Role) -> Result<String, AppError> {
        self.issue_with_ttl(username, role, self.settings.access_token_expiry)
    }

    /// Issue a signed bearer token with an explicit TTL in seconds.
    pub fn issue_with_ttl(
        &self,
        username: &str,
        role: Role,
        ttl_seconds: i64,
    ) -> Result<String, AppError> {
        let claims = Claims::new(
            username.to_string(),
            role,
            ttl_seconds,
            self.settings.issuer.clone(),
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.settings.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("token generation failed: {}", e)))
    }

    /// Validate a bearer token and return its claims.
    ///
    /// Fails with `AuthError::InvalidToken` if the token is revoked, its
    /// signature or issuer is wrong, or its expiry has passed. No leeway: a
    /// token issued with ttl=0 is already invalid.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        if self.revoked.is_revoked(token) {
            tracing::warn!("Rejected revoked token");
            return Err(AppError::Auth(AuthError::InvalidToken));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.leeway = 0;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.settings.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("Token validation error: {}", e);
            AppError::Auth(AuthError::InvalidToken)
        })?;

        // jsonwebtoken accepts exp == now; the expiry boundary itself must
        // already fail.
        if claims.is_expired() {
            return Err(AppError::Auth(AuthError::InvalidToken));
        }

        Ok(claims)
    }

    /// Add a token to the revocation set. Idempotent, and the token does not
    /// have to still be valid: the embedded expiry is read without enforcing
    /// signature or expiry so even garbage input gets a conservative entry.
    pub fn revoke(&self, token: &str) {
        let expires_at = self.peek_expiry(token).unwrap_or_else(|| {
            chrono::Utc::now().timestamp() + self.settings.access_token_expiry
        });
        self.revoked.revoke(token, expires_at);
    }

    /// Drop revocation entries whose expiry has passed.
    pub fn prune_expired(&self) -> usize {
        self.revoked.prune_expired()
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    /// Read the `exp` claim without any cryptographic checks. Used only to
    /// key revocation entries for pruning.
    fn peek_expiry(&self, token: &str) -> Option<i64> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims.exp)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TokenService {
        TokenService::new(JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
        })
    }

    #[test]
    fn test_issue_and_validate() {
        let service = test_service();

        let token = service
            .issue("alice", Role::User)
            .expect("Failed to issue token");
        let claims = service.validate(&token).expect("Failed to validate token");

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iss, "test");
    }

    #[test]
    fn test_invalid_token() {
        let service = test_service();
        assert!(service.validate("invalid.token.here").is_err());
    }

    #[test]
    fn test_tampered_token() {
        let service = test_service();

        let token = service
            .issue("alice", Role::User)
            .expect("Failed to issue token");
        let tampered = format!("{}X", token);

        assert!(service.validate(&tampered).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let service = test_service();
        let token = service
            .issue("alice", Role::User)
            .expect("Failed to issue token");

        let other = TokenService::new(JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            issuer: "wrong-issuer".to_string(),
        });

        assert!(other.validate(&token).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let service = test_service();
        let token = service
            .issue("alice", Role::User)
            .expect("Failed to issue token");

        let other = TokenService::new(JwtSettings {
            secret: "a-completely-different-signing-secret-42".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
        });

        assert!(other.validate(&token).is_err());
    }

    #[test]
    fn test_zero_ttl_token_is_immediately_invalid() {
        let service = test_service();

        let token = service
            .issue_with_ttl("alice", Role::User, 0)
            .expect("Failed to issue token");

        let err = service.validate(&token).unwrap_err();
        match err {
            AppError::Auth(AuthError::InvalidToken) => (),
            other => panic!("expected InvalidToken, got {:?}", other),
        }
    }

    #[test]
    fn test_revoked_token_fails_before_expiry() {
        let service = test_service();

        let token = service
            .issue("alice", Role::Admin)
            .expect("Failed to issue token");
        assert!(service.validate(&token).is_ok());

        service.revoke(&token);

        let err = service.validate(&token).unwrap_err();
        match err {
            AppError::Auth(AuthError::InvalidToken) => (),
            other => panic!("expected InvalidToken, got {:?}", other),
        }
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let service = test_service();

        let token = service
            .issue("alice", Role::User)
            .expect("Failed to issue token");
        service.revoke(&token);
        service.revoke(&token);

        assert_eq!(service.revoked_count(), 1);
        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_revoke_accepts_garbage_input() {
        let service = test_service();

        service.revoke("not-a-token-at-all");
        assert_eq!(service.revoked_count(), 1);
    }

    #[test]
    fn test_prune_drops_expired_entries() {
        let service = test_service();

        let expired = service
            .issue_with_ttl("alice", Role::User, 0)
            .expect("Failed to issue token");
        let live = service
            .issue("bob", Role::User)
            .expect("Failed to issue token");

        service.revoke(&expired);
        service.revoke(&live);
        assert_eq!(service.revoked_count(), 2);

        let removed = service.prune_expired();
        assert_eq!(removed, 1);
        assert_eq!(service.revoked_count(), 1);

        // Pruned-but-expired token still fails validation, on expiry.
        assert!(service.validate(&expired).is_err());
        // The live token stays revoked.
        assert!(service.validate(&live).is_err());
    }

    #[test]
    fn test_clones_share_revocations() {
        let service = test_service();
        let clone = service.clone();

        let token = service
            .issue("alice", Role::User)
            .expect("Failed to issue token");
        service.revoke(&token);

        assert!(clone.validate(&token).is_err());
    }
}
