//! Response body types.
//!
//! [`EdgeResponseBody`] is the body of every response the service produces:
//!
//! - **Buffered**: error texts, the health payload and transformed images.
//! - **Streaming**: passthrough objects, copied chunk by chunk from the store.
//! - **Empty**: preflights and `HEAD` responses.
//!
//! The streaming variant owns the store stream in an `Option` and takes it out
//! exactly once: when the stream ends, when it fails, or when hyper drops the
//! body because the client went away.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::StreamExt;
use http_body_util::Full;
use tracing::{debug, error};

use rustedge_core::ObjectBody;

/// Response body supporting buffered, streaming and empty modes.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper responses.
#[derive(Debug, Default)]
pub enum EdgeResponseBody {
    /// Fully materialized bytes.
    Buffered(Full<Bytes>),
    /// An object body streamed from the store.
    Streaming(ObjectStreamBody),
    /// No body.
    #[default]
    Empty,
}

impl EdgeResponseBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a streaming body over an object stream.
    #[must_use]
    pub fn streaming(stream: ObjectStreamBody) -> Self {
        Self::Streaming(stream)
    }
}

impl http_body::Body for EdgeResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Streaming(stream) => Pin::new(stream).poll_frame(cx),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Streaming(stream) => stream.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Streaming(stream) => stream.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}

/// A store stream handed to hyper as a response body.
///
/// A store failure after the headers went out is surfaced as a body error,
/// which makes hyper abort the connection instead of ending the response
/// cleanly with truncated content.
pub struct ObjectStreamBody {
    stream: Option<ObjectBody>,
    remaining: Option<u64>,
    key: String,
    request_id: String,
}

impl ObjectStreamBody {
    /// Wrap `stream`, expecting `size` bytes when known.
    #[must_use]
    pub fn new(
        stream: ObjectBody,
        size: Option<u64>,
        key: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            stream: Some(stream),
            remaining: size,
            key: key.into(),
            request_id: request_id.into(),
        }
    }

    /// Whether the store stream has already been released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }

    fn release(&mut self) {
        drop(self.stream.take());
    }
}

impl std::fmt::Debug for ObjectStreamBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStreamBody")
            .field("key", &self.key)
            .field("request_id", &self.request_id)
            .field("remaining", &self.remaining)
            .field("released", &self.is_released())
            .finish()
    }
}

impl http_body::Body for ObjectStreamBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let Some(stream) = this.stream.as_mut() else {
            return Poll::Ready(None);
        };

        match stream.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                if let Some(remaining) = this.remaining.as_mut() {
                    *remaining = remaining.saturating_sub(chunk.len() as u64);
                }
                Poll::Ready(Some(Ok(http_body::Frame::data(chunk))))
            }
            Poll::Ready(Some(Err(err))) => {
                error!(
                    key = %this.key,
                    request_id = %this.request_id,
                    error = %err,
                    "object stream failed after headers were sent, aborting"
                );
                this.release();
                Poll::Ready(Some(Err(std::io::Error::other(err))))
            }
            Poll::Ready(None) => {
                debug!(key = %this.key, request_id = %this.request_id, "object body completed");
                this.release();
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.stream.is_none()
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match (self.is_released(), self.remaining) {
            (true, _) => http_body::SizeHint::with_exact(0),
            (false, Some(remaining)) => http_body::SizeHint::with_exact(remaining),
            (false, None) => http_body::SizeHint::default(),
        }
    }
}

impl Drop for ObjectStreamBody {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!(
                key = %self.key,
                request_id = %self.request_id,
                "client aborted before the body completed"
            );
            self.release();
        }
    }
}
