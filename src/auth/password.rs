//! Salted password digests

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Generate a random hex salt
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// HMAC-SHA256 of the password keyed by the salt, hex encoded
pub fn digest_password(password: &str, salt: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes())?;
    mac.update(password.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison of a password against a stored digest
pub fn verify_password(password: &str, salt: &str, digest_hex: &str) -> bool {
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(salt.as_bytes()) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_password_verifies() {
        let salt = generate_salt();
        let digest = digest_password("realtor123", &salt).unwrap();
        assert!(verify_password("realtor123", &salt, &digest));
        assert!(!verify_password("realtor124", &salt, &digest));
    }

    #[test]
    fn salts_differ_between_calls() {
        let a = generate_salt();
        let b = generate_salt();
        assert_ne!(a, b);
        assert_ne!(
            digest_password("same", &a).unwrap(),
            digest_password("same", &b).unwrap()
        );
    }

    #[test]
    fn corrupt_digest_never_verifies() {
        assert!(!verify_password("anything", "salt", "not-hex"));
    }
}
