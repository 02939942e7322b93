//! Object stores.
//!
//! [`ObjectStore`] is the seam between the HTTP layer and the blob backend.
//! [`S3ObjectStore`] talks to any S3-compatible endpoint; [`MemoryObjectStore`]
//! keeps objects in process and backs local runs and tests.

mod memory;
mod s3;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::object::FetchedObject;

pub use memory::MemoryObjectStore;
pub use s3::{S3ObjectStore, build_s3_client};

/// A read-only blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Fetch `key` from `bucket`.
    ///
    /// Returns [`StoreError::NotFound`] when the key does not exist and
    /// [`StoreError::Unavailable`] for every other failure. The body of the
    /// returned object is not read yet.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<FetchedObject, StoreError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<T> {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<FetchedObject, StoreError> {
        (**self).get_object(bucket, key).await
    }
}
