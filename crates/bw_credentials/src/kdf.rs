//! Argon2id credential derivations.
//!
//! Two purpose-separated derivations share one cost profile:
//!
//! - login hash — salt `login-call`; transmitted instead of the password.
//! - local encryption key — salt `local-encryption-key`, with the username
//!   fed through Argon2's keyed (secret) input so equal passwords diverge
//!   per user; never transmitted, only persisted sealed.
//!
//! The salts must never coincide: compromise of the stored login hash must
//! not yield the local encryption key. Both derivations are deterministic
//! and deliberately seconds-scale; async callers run them on a blocking
//! thread.

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::CredentialsError;

const LOGIN_HASH_SALT: &[u8] = b"login-call";
const LOCAL_KEY_SALT: &[u8] = b"local-encryption-key";

/// Both derivations output 64 bytes (128 hex characters).
pub const DERIVED_KEY_LEN: usize = 64;

/// Fixed cost profile: 64 MiB, 3 iterations, 1 lane.
#[cfg(not(test))]
fn params() -> Params {
    Params::new(64 * 1024, 3, 1, Some(DERIVED_KEY_LEN))
        .expect("static Argon2 params are always valid")
}

/// Reduced cost for the in-crate suite; full-cost derivation turns a test
/// run into minutes. The algorithm and salts are identical.
#[cfg(test)]
fn params() -> Params {
    Params::new(16, 1, 1, Some(DERIVED_KEY_LEN))
        .expect("static Argon2 params are always valid")
}

/// 64-byte local encryption key. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct LocalEncryptionKey([u8; DERIVED_KEY_LEN]);

impl LocalEncryptionKey {
    /// Lowercase hex form — the representation that gets sealed.
    pub fn hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.0
    }
}

/// Hash transmitted to the auth service in place of the password.
/// Deterministic; 128 lowercase hex characters.
pub fn derive_login_hash(password: &str) -> Result<String, CredentialsError> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params());
    let mut output = [0u8; DERIVED_KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), LOGIN_HASH_SALT, &mut output)
        .map_err(|e| CredentialsError::KeyDerivation(e.to_string()))?;
    Ok(hex::encode(output))
}

/// Client-side encryption key. The username keys the derivation so two users
/// with the same password hold different keys.
pub fn derive_local_encryption_key(
    username: &str,
    password: &str,
) -> Result<LocalEncryptionKey, CredentialsError> {
    let argon2 = Argon2::new_with_secret(
        username.as_bytes(),
        Algorithm::Argon2id,
        Version::V0x13,
        params(),
    )
    .map_err(|e| CredentialsError::KeyDerivation(e.to_string()))?;
    let mut output = [0u8; DERIVED_KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), LOCAL_KEY_SALT, &mut output)
        .map_err(|e| CredentialsError::KeyDerivation(e.to_string()))?;
    Ok(LocalEncryptionKey(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_hash_is_deterministic_fixed_length_hex() {
        let first = derive_login_hash("Password1!").unwrap();
        let second = derive_login_hash("Password1!").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), DERIVED_KEY_LEN * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));

        let other = derive_login_hash("Password2!").unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn local_key_differs_per_username() {
        let alice = derive_local_encryption_key("alice", "Password1!").unwrap();
        let bob = derive_local_encryption_key("bob", "Password1!").unwrap();
        assert_ne!(alice.as_bytes(), bob.as_bytes());
    }

    #[test]
    fn local_key_is_deterministic() {
        let first = derive_local_encryption_key("alice", "Password1!").unwrap();
        let second = derive_local_encryption_key("alice", "Password1!").unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(first.hex().len(), DERIVED_KEY_LEN * 2);
    }

    #[test]
    fn derivations_are_domain_separated() {
        // Same password, different purpose salts: outputs must differ.
        let login = derive_login_hash("Password1!").unwrap();
        let local = derive_local_encryption_key("alice", "Password1!").unwrap();
        assert_ne!(login, *local.hex());
        assert_ne!(LOGIN_HASH_SALT, LOCAL_KEY_SALT);
    }
}
