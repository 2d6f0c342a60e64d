//! Object storage for generated images.
//!
//! The handlers depend on the [`ObjectStore`] trait; [`GcsStore`] is the
//! Google Cloud Storage implementation over the JSON API. Objects are created
//! once with a create-if-absent precondition, made publicly readable, and
//! never updated or deleted by this service.

pub mod store;

use async_trait::async_trait;
use thiserror::Error;

pub use store::GcsStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no bearer token available for storage access: {0}")]
    Auth(String),
    #[error("object `{object}` already exists")]
    AlreadyExists { object: String },
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("storage returned status {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("storage operation exceeded its {0}s deadline")]
    DeadlineExceeded(u64),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` as `object`, failing if the object already exists. The
    /// write is atomic from the caller's perspective.
    async fn create(&self, object: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Grant public read access to an existing `object`.
    async fn make_public(&self, object: &str) -> Result<(), StoreError>;

    fn bucket(&self) -> &str;

    /// Public download URL for `object` in this store's bucket.
    fn public_url(&self, object: &str) -> String {
        format!("https://storage.googleapis.com/{}/{object}", self.bucket())
    }
}
