//! Rate limiting utilities

use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter keyed by an arbitrary string (email address, client id)
pub type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Verification codes an address may request per minute
pub const VERIFICATION_CODE_RATE_LIMIT: u32 = 3;

/// Create a keyed rate limiter allowing `requests_per_minute` per key
pub fn create_keyed_limiter(requests_per_minute: u32) -> Arc<KeyedLimiter> {
    let quota =
        Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}
