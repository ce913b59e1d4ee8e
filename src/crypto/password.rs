//! Salted password hashing for the three identity tables.
//!
//! Stored format: `pbkdf2_sha256$<iterations>$<salt_b64>$<hash_b64>`.
//! Bare 64-char SHA-256 hex digests from older databases still verify.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::CryptoError;

const SCHEME: &str = "pbkdf2_sha256";
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

/// Unoptimised test builds would spend minutes in PBKDF2 otherwise.
pub const PBKDF2_ITERATIONS: u32 = if cfg!(test) { 1_000 } else { 210_000 };

/// Derived hash bytes: zeroed on drop
#[derive(Zeroize)]
#[zeroize(drop)]
struct DerivedHash([u8; HASH_LENGTH]);

impl DerivedHash {
    fn derive(password: &str, salt: &[u8], iterations: u32) -> Self {
        let mut out = [0u8; HASH_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
        Self(out)
    }
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    hash_password_with(password, &generate_salt(), PBKDF2_ITERATIONS)
}

/// Hash a password with an explicit salt and iteration count.
pub fn hash_password_with(
    password: &str,
    salt: &[u8],
    iterations: u32,
) -> Result<String, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }
    let derived = DerivedHash::derive(password, salt, iterations);
    Ok(format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(derived.0)
    ))
}

/// Check `password` against a stored hash in constant time.
///
/// Returns `Err(MalformedHash)` when the stored value is in neither the
/// PBKDF2 format nor the legacy SHA-256 hex format.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CryptoError> {
    if is_legacy_sha256(stored) {
        let digest = legacy_sha256_hex(password);
        return Ok(digest.as_bytes().ct_eq(stored.to_ascii_lowercase().as_bytes()).into());
    }

    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CryptoError::MalformedHash);
    };
    if scheme != SCHEME {
        return Err(CryptoError::MalformedHash);
    }
    let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
    if iterations == 0 {
        return Err(CryptoError::MalformedHash);
    }
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| CryptoError::MalformedHash)?;
    let expected = STANDARD_NO_PAD
        .decode(expected)
        .map_err(|_| CryptoError::MalformedHash)?;
    if expected.len() != HASH_LENGTH {
        return Err(CryptoError::MalformedHash);
    }

    let derived = DerivedHash::derive(password, &salt, iterations);
    Ok(derived.0.as_slice().ct_eq(expected.as_slice()).into())
}

/// Unsalted SHA-256 hex digest, the format older clinic databases stored.
pub fn legacy_sha256_hex(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn is_legacy_sha256(stored: &str) -> bool {
    stored.len() == 64 && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_succeeds() {
        let stored = hash_password("admin123").unwrap();
        assert!(stored.starts_with("pbkdf2_sha256$"));
        assert!(verify_password("admin123", &stored).unwrap());
    }

    #[test]
    fn wrong_password_rejected() {
        let stored = hash_password("admin123").unwrap();
        assert!(!verify_password("wrong", &stored).unwrap());
    }

    #[test]
    fn same_password_different_salts() {
        let a = hash_password("doctor123").unwrap();
        let b = hash_password("doctor123").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("doctor123", &a).unwrap());
        assert!(verify_password("doctor123", &b).unwrap());
    }

    #[test]
    fn deterministic_with_fixed_salt() {
        let salt = [7u8; SALT_LENGTH];
        let a = hash_password_with("pw", &salt, 10).unwrap();
        let b = hash_password_with("pw", &salt, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn iteration_count_is_read_from_stored_hash() {
        let stored = hash_password_with("pw", &[1u8; SALT_LENGTH], 5).unwrap();
        assert!(stored.starts_with("pbkdf2_sha256$5$"));
        assert!(verify_password("pw", &stored).unwrap());
    }

    #[test]
    fn empty_password_rejected() {
        assert_eq!(hash_password(""), Err(CryptoError::EmptyPassword));
    }

    #[test]
    fn legacy_sha256_hex_verifies() {
        let stored = legacy_sha256_hex("password123");
        assert_eq!(stored.len(), 64);
        assert!(verify_password("password123", &stored).unwrap());
        assert!(!verify_password("password124", &stored).unwrap());
        assert!(verify_password("password123", &stored.to_uppercase()).unwrap());
    }

    #[test]
    fn legacy_digest_matches_known_vector() {
        assert_eq!(
            legacy_sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn malformed_hashes_rejected() {
        for stored in [
            "",
            "plaintext",
            "md5$1$abc$def",
            "pbkdf2_sha256$notanumber$AAAA$AAAA",
            "pbkdf2_sha256$0$AAAA$AAAA",
            "pbkdf2_sha256$10$AAAA$AAAA",
            "pbkdf2_sha256$10$AAAA$AAAA$extra",
        ] {
            assert_eq!(
                verify_password("pw", stored),
                Err(CryptoError::MalformedHash),
                "{stored}"
            );
        }
    }
}
