//! bw_credentials — credential derivation and local key sealing for Burrow
//! Console
//!
//! # Design principles
//! - The raw password never leaves the client. Authentication sends a
//!   purpose-derived hash; the local encryption key is a second, independent
//!   derivation and is only ever persisted sealed under server-issued key
//!   material.
//! - Domain separation: the login hash and the local encryption key use
//!   distinct fixed salts, so neither derived secret reveals the other.
//! - Secret material is zeroized on drop.
//!
//! # Modules
//! - `api`   — backend client contract (`get`/`post`/`delete` → parsed response)
//! - `kdf`   — Argon2id derivations (login hash, local encryption key)
//! - `seal`  — AES-256-GCM sealing/unsealing of the local encryption key
//! - `client`— the credentials client: seal-and-store, unseal, sign-in and
//!   create-user flows
//! - `error` — unified error type

pub mod api;
pub mod client;
pub mod error;
pub mod kdf;
pub mod seal;

pub use api::{BackendClient, HttpBackendClient, ParsedResponse};
pub use client::{CredentialsClient, SignIn};
pub use error::CredentialsError;
