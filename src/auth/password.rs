//! Password hashing and verification using Argon2
//!
//! Uses the argon2id variant with library-default parameters. The stored
//! value is a PHC string carrying the salt and parameters, so verification
//! needs no extra state.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::LightstreamsError;

/// Hash a password for storage in the user registry
pub fn hash_password(password: &str) -> Result<String, LightstreamsError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LightstreamsError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, LightstreamsError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| LightstreamsError::Internal(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        let hash1 = hash_password("secret").unwrap();
        let hash2 = hash_password("secret").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("secret", &hash1).unwrap());
        assert!(verify_password("secret", &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(verify_password("password", "not-a-valid-hash").is_err());
    }
}
