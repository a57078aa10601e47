//! Account password hashing and verification.
//!
//! Hashing uses Argon2id with default parameters and a random salt from
//! `OsRng`. Hashes are stored in PHC string format.
//!
//! # Example
//!
//! ```
//! use redfish_auth::password::{hash_password, verify_password};
//!
//! let hash = hash_password("correct").unwrap();
//! assert!(verify_password("correct", &hash).unwrap());
//! assert!(!verify_password("wrong", &hash).unwrap());
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a password for storage using Argon2id.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id() {
        let hash = hash_password("secret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("secret").unwrap();
        let b = hash_password("secret").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("secret", &a).unwrap());
        assert!(verify_password("secret", &b).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("secret", "not-a-hash").is_err());
    }
}
