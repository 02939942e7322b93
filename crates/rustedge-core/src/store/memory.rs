//! In-process object store.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::StreamExt;
use md5::{Digest, Md5};

use super::ObjectStore;
use crate::config::DEFAULT_STREAM_CHUNK_SIZE;
use crate::error::StoreError;
use crate::object::{FetchedObject, bounded_chunks};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    etag: String,
    last_modified: DateTime<Utc>,
}

/// Objects held in a concurrent map keyed by `(bucket, key)`.
///
/// ETags are quoted hex MD5 digests, the same shape S3 reports for
/// single-part uploads. Bodies are served in chunks of at most
/// `chunk_size` bytes so consumers see a real multi-chunk stream.
#[derive(Debug)]
pub struct MemoryObjectStore {
    objects: DashMap<(String, String), StoredObject>,
    chunk_size: usize,
    fetches: AtomicUsize,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_STREAM_CHUNK_SIZE)
    }

    /// Create an empty store serving bodies in chunks of `chunk_size` bytes.
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            objects: DashMap::new(),
            chunk_size: chunk_size.max(1),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Store an object, replacing any previous one under the same key.
    /// Returns the computed ETag.
    pub fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> String {
        let data = data.into();
        let etag = format!("\"{}\"", hex::encode(Md5::digest(&data)));
        self.objects.insert(
            (bucket.to_owned(), key.to_owned()),
            StoredObject {
                data,
                content_type: content_type.map(str::to_owned),
                etag: etag.clone(),
                last_modified: Utc::now(),
            },
        );
        etag
    }

    /// Remove an object. Returns whether it existed.
    pub fn delete_object(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .remove(&(bucket.to_owned(), key.to_owned()))
            .is_some()
    }

    /// Number of `get_object` calls served so far, hits and misses alike.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<FetchedObject, StoreError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let stored = self
            .objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_owned(),
            })?;

        let size = stored.data.len() as u64;
        let body = futures::stream::once(async move { Ok::<_, StoreError>(stored.data) }).boxed();
        Ok(FetchedObject {
            key: key.to_owned(),
            content_type: stored.content_type,
            etag: Some(stored.etag),
            last_modified: Some(stored.last_modified),
            size: Some(size),
            body: bounded_chunks(body, self.chunk_size),
        })
    }
}
