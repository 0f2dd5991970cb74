//! Durable blob storage behind an object-safe trait.
//!
//! The pipeline only ever needs four capabilities: put, get, an
//! existence probe, and a public URL for a key. [`S3BlobStore`] is the
//! production implementation; [`MemoryBlobStore`] backs the tests.
//! Every write in the pipeline is idempotent (same key, deterministic
//! content), so implementations may freely overwrite.

pub mod memory;
pub mod s3;

pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

/// Errors from the blob storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested key does not exist.
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Any other backend failure (network, auth, throttling, ...).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Capability for reading and writing named byte blobs.
///
/// Injected into each stage as `Arc<dyn BlobStore>`; the process
/// entry point owns the concrete client's lifecycle.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` at `key`, overwriting any existing blob.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), StorageError>;

    /// Read the full contents of the blob at `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Cheap existence probe for `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Publicly retrievable URL for the blob at `key`.
    fn public_url(&self, key: &str) -> String;
}
