use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed store key: {0}")]
    MalformedKey(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("snapshot is corrupted: {0}")]
    Corruption(String),
}
