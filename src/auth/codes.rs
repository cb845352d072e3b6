//! One-time email verification codes

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;
use tracing::warn;

use super::AuthError;
use crate::util::rate_limit::{create_keyed_limiter, KeyedLimiter, VERIFICATION_CODE_RATE_LIMIT};

/// Email domains allowed to sign in with a code
pub const ALLOWED_CODE_DOMAINS: &[&str] = &["kwsingapore.com", "propertylimbrothers.com"];

/// How long an issued code stays valid
pub const CODE_TTL: Duration = Duration::from_secs(10 * 60);

/// Wrong guesses allowed before a pending code is thrown away
pub const MAX_CODE_ATTEMPTS: u32 = 5;

/// Whether `email` belongs to a domain that may use code sign-in
pub fn is_allowed_domain(email: &str) -> bool {
    let email = email.trim().to_ascii_lowercase();
    match email.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() => ALLOWED_CODE_DOMAINS.contains(&domain),
        _ => false,
    }
}

#[derive(Debug, Clone)]
struct PendingCode {
    code: String,
    expires_at: Instant,
    failed_attempts: u32,
}

/// Codes awaiting redemption, one per address
pub struct VerificationCodes {
    pending: DashMap<String, PendingCode>,
    limiter: Arc<KeyedLimiter>,
    ttl: Duration,
}

impl VerificationCodes {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            limiter: create_keyed_limiter(VERIFICATION_CODE_RATE_LIMIT),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh 6-digit code for `email`, replacing any earlier one
    pub fn issue(&self, email: &str) -> Result<String, AuthError> {
        let key = normalize(email);
        if self.limiter.check_key(&key).is_err() {
            return Err(AuthError::TooManyRequests);
        }

        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32));
        self.pending.insert(
            key,
            PendingCode {
                code: code.clone(),
                expires_at: Instant::now() + self.ttl,
                failed_attempts: 0,
            },
        );
        Ok(code)
    }

    /// Consume the code for `email`. A wrong code leaves the pending one in
    /// place until [`MAX_CODE_ATTEMPTS`] wrong guesses have been made.
    pub fn redeem(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let key = normalize(email);
        let mut pending = self.pending.get_mut(&key).ok_or(AuthError::InvalidCode)?;

        if pending.expires_at <= Instant::now() {
            drop(pending);
            self.pending.remove(&key);
            return Err(AuthError::CodeExpired);
        }

        if pending.code != code.trim() {
            pending.failed_attempts += 1;
            let exhausted = pending.failed_attempts >= MAX_CODE_ATTEMPTS;
            drop(pending);
            if exhausted {
                self.pending.remove(&key);
                warn!(email = %key, "Verification code discarded after repeated wrong guesses");
            }
            return Err(AuthError::InvalidCode);
        }

        drop(pending);
        self.pending.remove(&key);
        Ok(())
    }

    /// Forget `code` for `email` if it is still the pending one
    pub fn discard(&self, email: &str, code: &str) {
        self.pending.remove_if(&normalize(email), |_, p| p.code == code);
    }

    /// Drop codes past their expiry
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.pending.len();
        self.pending.retain(|_, p| p.expires_at > now);
        before - self.pending.len()
    }

    #[cfg(test)]
    pub fn peek(&self, email: &str) -> Option<String> {
        self.pending.get(&normalize(email)).map(|p| p.code.clone())
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_allow_list() {
        assert!(is_allowed_domain("x@kwsingapore.com"));
        assert!(is_allowed_domain("Agent@PropertyLimBrothers.com"));
        assert!(!is_allowed_domain("x@randomdomain.com"));
        assert!(!is_allowed_domain("x@sub.kwsingapore.com"));
        assert!(!is_allowed_domain("@kwsingapore.com"));
        assert!(!is_allowed_domain("kwsingapore.com"));
    }

    #[test]
    fn code_is_single_use() {
        let codes = VerificationCodes::new(CODE_TTL);
        let code = codes.issue("x@kwsingapore.com").unwrap();
        assert_eq!(code.len(), 6);

        assert!(codes.redeem("X@kwsingapore.com", &code).is_ok());
        assert!(matches!(
            codes.redeem("x@kwsingapore.com", &code),
            Err(AuthError::InvalidCode)
        ));
    }

    #[test]
    fn wrong_code_keeps_pending_code() {
        let codes = VerificationCodes::new(CODE_TTL);
        let code = codes.issue("x@kwsingapore.com").unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        assert!(matches!(
            codes.redeem("x@kwsingapore.com", wrong),
            Err(AuthError::InvalidCode)
        ));
        assert!(codes.redeem("x@kwsingapore.com", &code).is_ok());
    }

    #[test]
    fn code_is_discarded_after_too_many_wrong_guesses() {
        let codes = VerificationCodes::new(CODE_TTL);
        let code = codes.issue("admin@kwsingapore.com").unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..MAX_CODE_ATTEMPTS {
            assert!(matches!(
                codes.redeem("admin@kwsingapore.com", wrong),
                Err(AuthError::InvalidCode)
            ));
        }
        assert!(codes.peek("admin@kwsingapore.com").is_none());
        assert!(matches!(
            codes.redeem("admin@kwsingapore.com", &code),
            Err(AuthError::InvalidCode)
        ));
    }

    #[test]
    fn discard_only_drops_the_matching_code() {
        let codes = VerificationCodes::new(CODE_TTL);
        let code = codes.issue("x@kwsingapore.com").unwrap();
        let other = if code == "000000" { "111111" } else { "000000" };

        codes.discard("x@kwsingapore.com", other);
        assert_eq!(codes.peek("x@kwsingapore.com"), Some(code.clone()));

        codes.discard("X@kwsingapore.com", &code);
        assert!(codes.peek("x@kwsingapore.com").is_none());
    }

    #[test]
    fn expired_code_is_rejected() {
        let codes = VerificationCodes::new(Duration::ZERO);
        let code = codes.issue("x@kwsingapore.com").unwrap();
        assert!(matches!(
            codes.redeem("x@kwsingapore.com", &code),
            Err(AuthError::CodeExpired)
        ));
    }

    #[test]
    fn issuing_is_rate_limited_per_address() {
        let codes = VerificationCodes::new(CODE_TTL);
        for _ in 0..VERIFICATION_CODE_RATE_LIMIT {
            codes.issue("busy@kwsingapore.com").unwrap();
        }
        assert!(matches!(
            codes.issue("busy@kwsingapore.com"),
            Err(AuthError::TooManyRequests)
        ));
        assert!(codes.issue("other@kwsingapore.com").is_ok());
    }

    #[test]
    fn sweep_drops_expired_codes() {
        let codes = VerificationCodes::new(Duration::ZERO);
        codes.issue("x@kwsingapore.com").unwrap();
        assert_eq!(codes.sweep_expired(), 1);
        assert!(codes.peek("x@kwsingapore.com").is_none());
    }
}
