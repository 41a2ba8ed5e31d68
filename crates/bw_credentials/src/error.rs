use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("sealing failed: {0}")]
    Seal(String),

    #[error("unsealing failed (wrong key material or tampered blob)")]
    Unseal,

    #[error("sealing key material malformed: {0}")]
    SealingKeyMaterial(String),

    #[error("no sealed local encryption key is stored")]
    NoSealedKey,

    #[error("bad credentials")]
    BadCredentials,

    #[error("bad invitation")]
    BadInvitation,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("backend returned unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Store(#[from] bw_store::StoreError),

    #[error("serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    #[error("background derivation task failed: {0}")]
    TaskJoin(String),
}
