use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("item name {0:?} is not storable")]
    InvalidItemName(String),

    #[error("atomic replace failed: {0}")]
    Persist(String),
}
