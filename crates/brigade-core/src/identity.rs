//! One-way identity hashing for privacy-preserving ad matching.
//!
//! Conversion uploads identify users by SHA-256 digests of normalized
//! contact details rather than the raw values. The digest is computed over
//! the trimmed, lowercased input and rendered as lowercase hex; it is never
//! reversed by this system.
use sha2::{Digest, Sha256};

use crate::email;

/// SHA-256 of the trimmed, lowercased value as lowercase hex.
pub fn sha256_hex(value: &str) -> String {
    let normalized = value.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Hash an email address for enhanced conversion matching.
pub fn hash_email(email: &str) -> String {
    sha256_hex(&email::normalize(email))
}

/// Hash a phone number, digits only, for enhanced conversion matching.
pub fn hash_phone(phone: &str) -> String {
    sha256_hex(&email::normalize_phone(phone))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_and_case_insensitive() {
        assert_eq!(sha256_hex("Sarah@Gmail.com "), sha256_hex("sarah@gmail.com"));
    }

    #[test]
    fn known_vector() {
        // SHA-256("abc"), a standard test vector.
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn email_hash_sees_repaired_domain() {
        // "sarah@gmail" and "sarah@gmail.com" must match the same identity.
        assert_eq!(hash_email("SARAH@GMAIL"), hash_email("sarah@gmail.com"));
    }

    #[test]
    fn phone_hash_ignores_formatting() {
        assert_eq!(hash_phone("(734) 555-1234"), hash_phone("734-555-1234"));
    }
}
