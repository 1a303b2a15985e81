use anyhow::{anyhow, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

/// Hash a plaintext password into an argon2 PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

/// Verify a plaintext password against a stored hash.
///
/// Anything that is not a parseable PHC string never verifies, including
/// legacy plaintext values that have not been re-hashed yet.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Whether a stored credential is already an argon2 hash
pub fn is_hashed(stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| parsed.algorithm.as_str().starts_with("argon2"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_success() {
        let hash = hash_password("MySecurePassword123!").unwrap();
        assert_ne!(hash, "MySecurePassword123!");
        assert!(hash.starts_with("$argon2"));
        assert!(is_hashed(&hash));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("MySecret").unwrap();
        assert!(verify_password("MySecret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_plaintext_never_verifies() {
        assert!(!verify_password("hunter2", "hunter2"));
        assert!(!is_hashed("hunter2"));
        assert!(!is_hashed(""));
    }
}
