//! Session tokens: HS256 JWT issue, verification and revocation

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use super::role::Role;
use super::AuthError;
use crate::store::users::User;
use crate::util::time::unix_secs;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    /// Token ID, used for revocation on logout
    pub jti: Uuid,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl SessionClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Sign claims into a compact JWT
pub fn sign_jwt(claims: &SessionClaims, secret: &str) -> Result<String, AuthError> {
    let header_b64 = URL_SAFE_NO_PAD.encode(HEADER);
    let payload = serde_json::to_vec(claims).map_err(|_| AuthError::InvalidToken)?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);

    let message = format!("{}.{}", header_b64, payload_b64);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(message.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", message, signature_b64))
}

/// Verify a JWT and extract its claims
pub fn verify_jwt(token: &str, secret: &str, now: u64) -> Result<SessionClaims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidToken);
    }

    let header_b64 = parts[0];
    let payload_b64 = parts[1];
    let signature_b64 = parts[2];

    let message = format!("{}.{}", header_b64, payload_b64);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(message.as_bytes());

    let provided_signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::InvalidToken)?;
    mac.verify_slice(&provided_signature)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AuthError::InvalidToken)?;
    let claims: SessionClaims =
        serde_json::from_slice(&payload_json).map_err(|_| AuthError::InvalidToken)?;

    if claims.exp <= now {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Extract a token from an `Authorization: Bearer ...` header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Issues and checks session tokens, remembering revoked ones until they expire
pub struct SessionTokens {
    secret: String,
    ttl: Duration,
    /// jti -> exp of tokens ended by logout
    revoked: DashMap<Uuid, u64>,
}

impl SessionTokens {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
            revoked: DashMap::new(),
        }
    }

    /// Issue a token for `user`
    pub fn issue(&self, user: &User) -> Result<(String, SessionClaims), AuthError> {
        let now = unix_secs();
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + self.ttl.as_secs().max(1),
        };
        let token = sign_jwt(&claims, &self.secret)?;
        Ok((token, claims))
    }

    /// Verify a token, rejecting revoked ones
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let claims = verify_jwt(token, &self.secret, unix_secs())?;
        if self.revoked.contains_key(&claims.jti) {
            return Err(AuthError::SessionRevoked);
        }
        Ok(claims)
    }

    /// End a session before its natural expiry
    pub fn revoke(&self, claims: &SessionClaims) {
        self.revoked.insert(claims.jti, claims.exp);
    }

    /// Forget revocations whose tokens would have expired anyway
    pub fn sweep_expired(&self) -> usize {
        let now = unix_secs();
        let before = self.revoked.len();
        self.revoked.retain(|_, exp| *exp > now);
        before - self.revoked.len()
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn claims(exp: u64) -> SessionClaims {
        SessionClaims {
            sub: Uuid::new_v4(),
            email: "agent@kwsingapore.com".to_string(),
            role: Role::Realtor,
            jti: Uuid::new_v4(),
            iat: 1_000,
            exp,
        }
    }

    #[test]
    fn signed_token_verifies() {
        let original = claims(10_000);
        let token = sign_jwt(&original, SECRET).unwrap();
        let verified = verify_jwt(&token, SECRET, 5_000).unwrap();
        assert_eq!(verified.sub, original.sub);
        assert_eq!(verified.role, Role::Realtor);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_jwt(&claims(10_000), SECRET).unwrap();
        let err = verify_jwt(&token, "another-secret-of-sufficient-length!", 5_000).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = sign_jwt(&claims(10_000), SECRET).unwrap();
        let mut forged = claims(10_000);
        forged.role = Role::Admin;
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let parts: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert!(matches!(
            verify_jwt(&tampered, SECRET, 5_000),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = sign_jwt(&claims(2_000), SECRET).unwrap();
        assert!(matches!(
            verify_jwt(&token, SECRET, 2_000),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(matches!(
            verify_jwt("not-a-token", SECRET, 0),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn revoked_token_fails_verification() {
        let tokens = SessionTokens::new(SECRET, Duration::from_secs(60));
        let user = User::test_user(Role::Vendor);
        let (token, claims) = tokens.issue(&user).unwrap();

        assert!(tokens.verify(&token).is_ok());
        tokens.revoke(&claims);
        assert!(matches!(
            tokens.verify(&token),
            Err(AuthError::SessionRevoked)
        ));
        // Still within its lifetime, so the revocation is kept
        assert_eq!(tokens.sweep_expired(), 0);
        assert_eq!(tokens.revoked_count(), 1);
    }

    #[test]
    fn sweep_forgets_revocations_of_expired_tokens() {
        let tokens = SessionTokens::new(SECRET, Duration::from_secs(60));
        let live = tokens.issue(&User::test_user(Role::Client)).unwrap().1;
        tokens.revoke(&live);
        tokens.revoke(&claims(1));
        assert_eq!(tokens.revoked_count(), 2);

        assert_eq!(tokens.sweep_expired(), 1);
        assert_eq!(tokens.revoked_count(), 1);
        assert!(matches!(
            tokens.verify(&sign_jwt(&live, SECRET).unwrap()),
            Err(AuthError::SessionRevoked)
        ));
    }
}
