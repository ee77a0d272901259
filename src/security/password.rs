use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as HashError, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};

/// Hashes a plaintext password with Argon2id, returning a PHC-format string
/// that embeds the algorithm parameters and salt.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;

    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored PHC-format hash. A mismatched
/// password returns `Ok(false)`, any other failure means the stored hash is unusable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, HashError> {
    let parsed_hash = PasswordHash::new(stored_hash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("hunter2hunter2").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));

        assert_that!(verify_password("hunter2hunter2", &hash)).is_ok_containing(true);
        assert_that!(verify_password("wrong-password", &hash)).is_ok_containing(false);
    }

    #[test]
    fn unparseable_hash_is_an_error() {
        let verify_result = verify_password("hunter2hunter2", "definitely-not-a-phc-string");
        assert_that!(verify_result).is_err();
    }
}
