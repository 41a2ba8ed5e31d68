//! bw_store — client-local persistent storage for Burrow Console
//!
//! A deliberately small key/value surface modelled on browser local storage:
//! string items under fixed names, whole-value overwrite, no partial updates.
//! The only item the credential subsystem uses is the sealed local encryption
//! key blob.
//!
//! Writes must be atomic — a reader never observes a torn value. The file
//! backend guarantees this with a same-directory temp file + rename.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{FileStore, MemoryStore, SealedKeyStore, SEALED_KEY_ITEM};
