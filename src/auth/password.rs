//! Secret hashing with Argon2, plus the one-time code generator
//!
//! Passwords and one-time codes share the same argon2id hashing: neither is
//! ever stored or embedded in a token in cleartext.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use std::sync::OnceLock;

use crate::types::AuthError;

/// Hash a secret using Argon2id
///
/// Returns the PHC-formatted hash string that includes the salt and parameters.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Failed to hash secret: {e}")))
}

/// Verify a secret against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(format!("Invalid hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash to verify against when no principal matches the identity.
///
/// Unknown identities and wrong passwords then both cost one argon2 verify.
pub fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| hash_password("workstation-decoy-secret").ok())
        .as_deref()
}

/// Random 6-digit numeric one-time code
pub fn generate_mfa_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2-but-longer").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2-but-longer", &hash).unwrap());
        assert!(!verify_password("hunter3-but-longer", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(verify_password("password", "plaintext-not-phc").is_err());
    }

    #[test]
    fn test_decoy_hash_is_stable_phc() {
        let decoy = decoy_hash().unwrap();
        assert!(decoy.starts_with("$argon2id$"));
        assert_eq!(decoy_hash(), Some(decoy));
        assert!(!verify_password("any password", decoy).unwrap());
    }

    #[test]
    fn test_mfa_code_shape() {
        for _ in 0..200 {
            let code = generate_mfa_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }
}
