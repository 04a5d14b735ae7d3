//! Email normalization and best-effort typo repair.
//!
//! Addresses are trimmed and lowercased, then a fixed table of major
//! providers repairs the common "missing TLD" typo (`user@gmail` becomes
//! `user@gmail.com`). This is not a validator and makes no deliverability
//! guarantee.

/// Provider domains commonly typed without their top-level domain.
const DOMAIN_FIXES: &[(&str, &str)] = &[
    ("@gmail", "@gmail.com"),
    ("@yahoo", "@yahoo.com"),
    ("@hotmail", "@hotmail.com"),
    ("@outlook", "@outlook.com"),
    ("@icloud", "@icloud.com"),
    ("@aol", "@aol.com"),
    ("@me", "@me.com"),
];

/// Trim, lowercase, and repair a trailing provider domain missing its TLD.
pub fn normalize(email: &str) -> String {
    let trimmed = email.trim().to_lowercase();
    for (suffix, fix) in DOMAIN_FIXES {
        if trimmed.ends_with(suffix) {
            let stem = &trimmed[..trimmed.len() - suffix.len()];
            return format!("{stem}{fix}");
        }
    }
    trimmed
}

/// Digits-only form of a phone number, used for identity hashing.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}
