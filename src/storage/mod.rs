//! Key-value storage used for the cart snapshot, the bearer token and the user profile.
//!
//! The store itself is an external collaborator; this module defines the seam
//! and ships an in-memory backend for tests and a file backend for the demo.

use async_trait::async_trait;
use thiserror::Error;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    /// The key is not usable by this backend.
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    /// The backend failed to read or write.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

/// Asynchronous string key-value store. Each operation may fail independently.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes the key. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
