//! Session token material: selector/validator generation and hashing.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha512};

/// Length of the public selector stored as the primary key.
pub const SELECTOR_LEN: usize = 12;
/// Random bytes behind the secret validator.
pub const VALIDATOR_BYTES: usize = 32;
/// Length of the per-token salt.
pub const SALT_LEN: usize = 8;

/// Freshly generated token material for one session.
///
/// `selector` and `validator` go to the client; `salt_code` and
/// `hashed_validator` go to storage. The plaintext validator is never
/// persisted.
#[derive(Debug, Clone)]
pub struct TokenMaterial {
    /// Public lookup key.
    pub selector: String,
    /// Secret half, handed to the client once.
    pub validator: String,
    /// Per-token salt.
    pub salt_code: String,
    /// Salted SHA-512 of the validator, hex encoded.
    pub hashed_validator: String,
}

/// Generate fresh token material.
pub fn generate() -> TokenMaterial {
    let selector = random_alphanumeric(SELECTOR_LEN);
    let salt_code = random_alphanumeric(SALT_LEN);

    let mut bytes = [0u8; VALIDATOR_BYTES];
    rand::rng().fill(&mut bytes);
    let validator = URL_SAFE_NO_PAD.encode(bytes);

    let hashed_validator = hash_validator(&validator, &salt_code);
    TokenMaterial {
        selector,
        validator,
        salt_code,
        hashed_validator,
    }
}

/// Salted SHA-512 of a validator, hex encoded (128 characters).
pub fn hash_validator(validator: &str, salt_code: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(salt_code.as_bytes());
    hasher.update(validator.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Verify a presented validator against the stored hash in constant time.
pub fn verify_validator(presented: &str, salt_code: &str, stored_hash: &str) -> bool {
    let computed = hash_validator(presented, salt_code);
    constant_time_eq(computed.as_bytes(), stored_hash.as_bytes())
}

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_shape_fits_storage() {
        let material = generate();
        assert_eq!(material.selector.len(), SELECTOR_LEN);
        assert_eq!(material.salt_code.len(), SALT_LEN);
        assert_eq!(material.hashed_validator.len(), 128);
        assert!(material.hashed_validator.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_is_unique() {
        let a = generate();
        let b = generate();
        assert_ne!(a.selector, b.selector);
        assert_ne!(a.validator, b.validator);
    }

    #[test]
    fn test_verify_accepts_the_right_validator() {
        let material = generate();
        assert!(verify_validator(
            &material.validator,
            &material.salt_code,
            &material.hashed_validator
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_validator_and_salt() {
        let material = generate();
        assert!(!verify_validator(
            "not-the-validator",
            &material.salt_code,
            &material.hashed_validator
        ));
        assert!(!verify_validator(
            &material.validator,
            "badsalt1",
            &material.hashed_validator
        ));
    }

    #[test]
    fn test_constant_time_eq_length_mismatch() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"abcd", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abce"));
    }
}
