//! Argon2id password hashing and the change-password rules.

use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

use crate::api::handlers::ApiError;

/// Hash a password into a PHC string with a fresh salt.
///
/// # Errors
/// Returns an error if Argon2 rejects the input.
pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// # Errors
/// Returns an error if the stored hash cannot be parsed.
pub(crate) fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Checks on the two new-password fields, once the old one has been verified.
pub(crate) fn check_new_password(
    old_password: &str,
    new_password1: &str,
    new_password2: &str,
) -> Result<(), ApiError> {
    if new_password1 != new_password2 {
        return Err(ApiError::bad_request("New passwords do not match."));
    }
    if new_password1 == old_password {
        return Err(ApiError::bad_request(
            "New password must differ from the old password.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrip() -> Result<(), ApiError> {
        let hash = hash_password("correct horse")?;
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash)?);
        assert!(!verify_password("battery staple", &hash)?);
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<(), ApiError> {
        assert_ne!(hash_password("same")?, hash_password("same")?);
        Ok(())
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "plain-text").is_err());
    }

    #[test]
    fn new_passwords_must_match() {
        let result = check_new_password("old", "new-one", "new-two");
        assert!(matches!(
            result,
            Err(ApiError::BadRequest(ref message)) if message == "New passwords do not match."
        ));
    }

    #[test]
    fn new_password_must_differ() {
        let result = check_new_password("same", "same", "same");
        assert!(matches!(
            result,
            Err(ApiError::BadRequest(ref message))
                if message == "New password must differ from the old password."
        ));
        assert!(check_new_password("old", "new", "new").is_ok());
    }
}
