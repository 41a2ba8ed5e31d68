//! Sealing the local encryption key under server-issued key material.
//!
//! The auth service issues `{ key, iv }` per sealing request: 32 bytes of
//! AES-256 key and a 16-byte IV, both fresh per request and never reused.
//! The client encrypts the derived key's hex form (plus a fixed validation
//! marker suffix) with AES-256-GCM using the full 16-byte IV as nonce, and
//! base64-encodes the ciphertext for storage.
//!
//! The marker suffix lets `unseal` prove a decryption actually recovered the
//! key rather than garbage, independently of the GCM tag.
//!
//! A legacy deployment variant answered `{ sealing_key }` alone and relied on
//! one fixed IV shared across every user and session. Fixed-IV reuse is a
//! known weakness; that shape is rejected outright instead of silently
//! downgraded to.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;
use tracing::warn;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::CredentialsError;

/// Appended to the plaintext before sealing; checked and stripped on unseal.
pub const KEY_VALIDATION_MARKER: &str = "_burrow_key_check_v1";

/// AES-256-GCM with the server's full 16-byte IV as nonce.
type SealingCipher = AesGcm<Aes256, U16>;

/// Ephemeral symmetric material for exactly one seal or unseal operation.
/// Never cached, never persisted; zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct SealingKeyMaterial {
    key: [u8; 32],
    iv: [u8; 16],
}

impl SealingKeyMaterial {
    pub fn new(key: [u8; 32], iv: [u8; 16]) -> Self {
        Self { key, iv }
    }

    /// Parse the `/sealing-key` response body.
    pub fn from_response(payload: &Value) -> Result<Self, CredentialsError> {
        if payload.get("sealing_key").is_some() {
            warn!("auth service answered with the deprecated fixed-IV sealing shape");
            return Err(CredentialsError::SealingKeyMaterial(
                "fixed-IV sealing responses are not accepted".into(),
            ));
        }

        let key = material_field(payload, "key")?;
        let iv = material_field(payload, "iv")?;
        if key.len() != 32 {
            return Err(CredentialsError::SealingKeyMaterial(format!(
                "key must be 32 bytes, got {}",
                key.len()
            )));
        }
        if iv.len() != 16 {
            return Err(CredentialsError::SealingKeyMaterial(format!(
                "iv must be 16 bytes, got {}",
                iv.len()
            )));
        }

        let mut material = Self {
            key: [0u8; 32],
            iv: [0u8; 16],
        };
        material.key.copy_from_slice(key.as_bytes());
        material.iv.copy_from_slice(iv.as_bytes());
        Ok(material)
    }
}

fn material_field<'a>(payload: &'a Value, field: &str) -> Result<&'a str, CredentialsError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| CredentialsError::SealingKeyMaterial(format!("missing field {field:?}")))
}

/// Encrypt `key_hex` + marker; returns the base64 blob to persist.
pub fn seal(material: &SealingKeyMaterial, key_hex: &str) -> Result<String, CredentialsError> {
    let cipher = SealingCipher::new_from_slice(&material.key)
        .map_err(|e| CredentialsError::Seal(e.to_string()))?;
    let nonce = Nonce::<U16>::from_slice(&material.iv);

    let plaintext = Zeroizing::new(format!("{key_hex}{KEY_VALIDATION_MARKER}"));
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| CredentialsError::Seal(e.to_string()))?;

    Ok(BASE64.encode(ciphertext))
}

/// Decrypt a stored blob and verify the validation marker. Returns the key's
/// hex form with the marker stripped.
pub fn unseal(
    material: &SealingKeyMaterial,
    blob: &str,
) -> Result<Zeroizing<String>, CredentialsError> {
    let cipher = SealingCipher::new_from_slice(&material.key)
        .map_err(|_| CredentialsError::Unseal)?;
    let nonce = Nonce::<U16>::from_slice(&material.iv);

    let ciphertext = BASE64.decode(blob)?;
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|_| CredentialsError::Unseal)?;
    let plaintext = Zeroizing::new(
        String::from_utf8(plaintext).map_err(|_| CredentialsError::Unseal)?,
    );

    let key_hex = plaintext
        .strip_suffix(KEY_VALIDATION_MARKER)
        .ok_or(CredentialsError::Unseal)?;
    Ok(Zeroizing::new(key_hex.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn material() -> SealingKeyMaterial {
        SealingKeyMaterial::new([7u8; 32], [3u8; 16])
    }

    #[test]
    fn seal_unseal_roundtrip() {
        let key_hex = "ab".repeat(64);
        let blob = seal(&material(), &key_hex).unwrap();
        let recovered = unseal(&material(), &blob).unwrap();
        assert_eq!(*recovered, key_hex);
    }

    #[test]
    fn unseal_with_wrong_material_fails() {
        let blob = seal(&material(), &"cd".repeat(64)).unwrap();
        let wrong = SealingKeyMaterial::new([8u8; 32], [3u8; 16]);
        assert!(matches!(
            unseal(&wrong, &blob),
            Err(CredentialsError::Unseal)
        ));
    }

    #[test]
    fn parses_key_iv_response() {
        let payload = json!({
            "key": "0123456789abcdef0123456789abcdef",
            "iv": "0123456789abcdef",
        });
        SealingKeyMaterial::from_response(&payload).unwrap();
    }

    #[test]
    fn rejects_legacy_fixed_iv_response() {
        let payload = json!({ "sealing_key": "0123456789abcdef0123456789abcdef" });
        assert!(matches!(
            SealingKeyMaterial::from_response(&payload),
            Err(CredentialsError::SealingKeyMaterial(_))
        ));
    }

    #[test]
    fn rejects_wrong_length_material() {
        let payload = json!({ "key": "short", "iv": "0123456789abcdef" });
        assert!(SealingKeyMaterial::from_response(&payload).is_err());

        let payload = json!({
            "key": "0123456789abcdef0123456789abcdef",
            "iv": "short",
        });
        assert!(SealingKeyMaterial::from_response(&payload).is_err());
    }

    #[test]
    fn tampered_blob_fails_authentication() {
        let blob = seal(&material(), &"ef".repeat(64)).unwrap();
        let mut bytes = BASE64.decode(&blob).unwrap();
        bytes[0] ^= 0x01;
        let tampered = BASE64.encode(bytes);
        assert!(unseal(&material(), &tampered).is_err());
    }
}
