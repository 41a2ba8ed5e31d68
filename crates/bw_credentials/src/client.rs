//! The credentials client: every operation a login or account-creation
//! screen needs, with the raw password never crossing the wire.
//!
//! All operations are one-shot user actions — nothing here retries. A failed
//! seal aborts before persistence, so the previously stored blob survives
//! any partial failure. Concurrent seal calls for one username are
//! single-flighted; the last completed write wins.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tracing::{info, warn};
use zeroize::Zeroizing;

use bw_routing::Router;
use bw_store::{SealedKeyStore, SEALED_KEY_ITEM};

use crate::api::BackendClient;
use crate::error::CredentialsError;
use crate::kdf;
use crate::seal::{seal, unseal, SealingKeyMaterial};

/// Successful sign-in. `redirect` is set only when the caller supplied a
/// return URI that passed validation against the current base domain; the
/// caller then performs the full location replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    pub redirect: Option<String>,
}

pub struct CredentialsClient {
    auth: Arc<dyn BackendClient>,
    store: Arc<dyn SealedKeyStore>,
    /// Per-username single-flight slots for seal operations.
    sealing: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CredentialsClient {
    /// `auth` must be rooted at the auth service's API.
    pub fn new(auth: Arc<dyn BackendClient>, store: Arc<dyn SealedKeyStore>) -> Self {
        Self {
            auth,
            store,
            sealing: Mutex::new(HashMap::new()),
        }
    }

    // ── Derivation ───────────────────────────────────────────────────────────

    /// Login hash for `password`, derived off the async runtime — this is a
    /// deliberately seconds-scale Argon2id call.
    pub async fn login_password_hash(&self, password: &str) -> Result<String, CredentialsError> {
        let password = Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || kdf::derive_login_hash(&password))
            .await
            .map_err(|e| CredentialsError::TaskJoin(e.to_string()))?
    }

    // ── Sealing ──────────────────────────────────────────────────────────────

    /// Derive the local encryption key, seal it under fresh server-issued
    /// key material, and persist the blob — wholesale overwrite of any
    /// previous value. Any failure before the store write leaves the prior
    /// blob untouched.
    pub async fn seal_and_store_local_encryption_key(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), CredentialsError> {
        let slot = {
            let mut sealing = self.sealing.lock();
            sealing.entry(username.to_string()).or_default().clone()
        };
        let result = {
            let _guard = slot.lock().await;
            self.derive_seal_and_store(username, password).await
        };

        // Prune the slot once nobody else holds it: under the map lock the
        // only remaining references are the map's and ours.
        let mut sealing = self.sealing.lock();
        if Arc::strong_count(&slot) <= 2 {
            sealing.remove(username);
        }
        result
    }

    async fn derive_seal_and_store(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), CredentialsError> {
        let owned_username = username.to_string();
        let owned_password = Zeroizing::new(password.to_string());
        let local_key = tokio::task::spawn_blocking(move || {
            kdf::derive_local_encryption_key(&owned_username, &owned_password)
        })
        .await
        .map_err(|e| CredentialsError::TaskJoin(e.to_string()))??;

        let material = self.fetch_sealing_key_material().await?;
        let blob = seal(&material, &local_key.hex())?;

        self.store.put(SEALED_KEY_ITEM, &blob)?;
        info!(username, "sealed local encryption key stored");
        Ok(())
    }

    /// Read the persisted blob back and recover the key's hex form,
    /// verifying the validation marker.
    pub async fn unseal_local_encryption_key(
        &self,
    ) -> Result<Zeroizing<String>, CredentialsError> {
        let blob = self
            .store
            .get(SEALED_KEY_ITEM)?
            .ok_or(CredentialsError::NoSealedKey)?;
        let material = self.fetch_sealing_key_material().await?;
        unseal(&material, &blob)
    }

    /// One fresh `{ key, iv }` per invocation; never cached.
    async fn fetch_sealing_key_material(
        &self,
    ) -> Result<SealingKeyMaterial, CredentialsError> {
        let response = self.auth.get("/sealing-key").await?;
        match response.status_code {
            401 => return Err(CredentialsError::BadCredentials),
            status if status >= 400 => return Err(CredentialsError::UnexpectedStatus(status)),
            _ => {}
        }
        let payload = response.json_payload.ok_or_else(|| {
            CredentialsError::SealingKeyMaterial("empty sealing-key response".into())
        })?;
        SealingKeyMaterial::from_response(&payload)
    }

    // ── Flows ────────────────────────────────────────────────────────────────

    /// Sign in: derive the login hash, authenticate, then seal and store the
    /// local encryption key. A failed seal fails the sign-in — success is
    /// never reported with the key left unsealed.
    pub async fn sign_in(
        &self,
        router: &Router,
        username: &str,
        password: &str,
        return_uri: Option<&str>,
    ) -> Result<SignIn, CredentialsError> {
        if !is_valid_username(username) || password.is_empty() {
            return Err(CredentialsError::BadCredentials);
        }

        let password_hash = self.login_password_hash(password).await?;
        let result = self
            .auth
            .post(
                "/login",
                Some(json!({
                    "username": username,
                    "password_hash": password_hash,
                })),
            )
            .await?;

        match result.status_code {
            401 => Err(CredentialsError::BadCredentials),
            status if status >= 400 => Err(CredentialsError::UnexpectedStatus(status)),
            _ => {
                self.seal_and_store_local_encryption_key(username, password)
                    .await?;

                let redirect = return_uri
                    .filter(|uri| {
                        let valid = router.is_valid_return_uri(uri);
                        if !valid {
                            warn!(uri, "dropping invalid return URI after sign-in");
                        }
                        valid
                    })
                    .map(str::to_string);
                Ok(SignIn { redirect })
            }
        }
    }

    /// Create a user from an invitation.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        invitation_id: Option<&str>,
    ) -> Result<(), CredentialsError> {
        if !is_valid_username(username) || password.is_empty() {
            return Err(CredentialsError::InvalidCredentials);
        }

        let password_hash = self.login_password_hash(password).await?;
        let result = self
            .auth
            .post(
                "/create-user",
                Some(json!({
                    "username": username,
                    "password_hash": password_hash,
                    "invitation_id": invitation_id,
                })),
            )
            .await?;

        match result.status_code {
            401 => Err(CredentialsError::BadInvitation),
            400 => Err(CredentialsError::InvalidCredentials),
            status if status >= 400 => Err(CredentialsError::UnexpectedStatus(status)),
            _ => Ok(()),
        }
    }
}

/// 6–32 characters from `[a-zA-Z0-9._-]`.
pub fn is_valid_username(username: &str) -> bool {
    (6..=32).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
