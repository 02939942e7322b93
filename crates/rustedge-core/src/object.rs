//! Request-scoped object model.
//!
//! A [`FetchedObject`] is what the store hands back: metadata plus a body
//! stream that can be consumed once. A [`TransformedObject`] only exists when
//! the image path ran and always holds its bytes in full.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream};
use futures::StreamExt;

use crate::error::StoreError;

/// Incrementally readable object body.
pub type ObjectBody = BoxStream<'static, Result<Bytes, StoreError>>;

/// Content type reported when the store has none for an object.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// An object fetched from the store.
pub struct FetchedObject {
    /// Storage key the object was fetched from.
    pub key: String,
    /// Declared content type, if the store has one.
    pub content_type: Option<String>,
    /// Entity tag as reported by the store (quotes included).
    pub etag: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// Body length in bytes, if known up front.
    pub size: Option<u64>,
    /// The body, consumed at most once.
    pub body: ObjectBody,
}

impl FetchedObject {
    /// Content type to advertise for a passthrough response.
    #[must_use]
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(FALLBACK_CONTENT_TYPE)
    }

    /// Split the object into its metadata and its body.
    #[must_use]
    pub fn into_parts(self) -> (ObjectMeta, ObjectBody) {
        let meta = ObjectMeta {
            key: self.key,
            content_type: self.content_type,
            etag: self.etag,
            last_modified: self.last_modified,
            size: self.size,
        };
        (meta, self.body)
    }
}

impl fmt::Debug for FetchedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedObject")
            .field("key", &self.key)
            .field("content_type", &self.content_type)
            .field("etag", &self.etag)
            .field("last_modified", &self.last_modified)
            .field("size", &self.size)
            .field("body", &"...")
            .finish()
    }
}

/// Metadata of a fetched object once its body has been taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Storage key.
    pub key: String,
    /// Declared content type.
    pub content_type: Option<String>,
    /// Entity tag.
    pub etag: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// Body length in bytes, if known.
    pub size: Option<u64>,
}

impl ObjectMeta {
    /// Content type to advertise for a passthrough response.
    #[must_use]
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(FALLBACK_CONTENT_TYPE)
    }
}

/// The output of a resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedObject {
    /// Mime type of the encoded bytes.
    pub mime_type: String,
    /// Encoded image.
    pub bytes: Bytes,
}

/// Re-chunk a body so that no chunk is larger than `chunk_size` bytes.
///
/// Chunks are split with [`Bytes::split_to`], so no data is copied.
#[must_use]
pub fn bounded_chunks(body: ObjectBody, chunk_size: usize) -> ObjectBody {
    let chunk_size = chunk_size.max(1);
    body.flat_map(move |item| {
        let pieces: Vec<Result<Bytes, StoreError>> = match item {
            Ok(mut data) => {
                let mut out = Vec::with_capacity(data.len() / chunk_size + 1);
                while data.len() > chunk_size {
                    out.push(Ok(data.split_to(chunk_size)));
                }
                if !data.is_empty() {
                    out.push(Ok(data));
                }
                out
            }
            Err(e) => vec![Err(e)],
        };
        stream::iter(pieces)
    })
    .boxed()
}
