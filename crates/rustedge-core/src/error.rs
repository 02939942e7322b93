//! Error types for the fetch/transform pipeline.
//!
//! [`StoreError`] covers the object fetcher, [`TransformError`] the image
//! transformer, and [`EdgeError`] is what the request boundary sees. Every
//! variant maps to exactly one HTTP status through [`EdgeError::status`].

/// Object store failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key does not exist in the bucket.
    #[error("object not found: {key}")]
    NotFound {
        /// The key that was not found.
        key: String,
    },

    /// Any other store-level failure (network, auth, malformed response, a
    /// body stream that broke while being read).
    #[error("object store unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Build an [`StoreError::Unavailable`] from anything printable.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Image transform failure.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The input could not be decoded (corrupt or unsupported data).
    #[error("image decode failed: {0}")]
    Decode(String),

    /// The resized image could not be encoded.
    #[error("image encode failed: {0}")]
    Encode(String),

    /// The input exceeds the configured transform input limit.
    #[error("transform input of {size} bytes exceeds the {max} byte limit")]
    InputTooLarge {
        /// Bytes read before giving up.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    /// Spilling the input to a temporary file failed.
    #[error("transform buffer I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking transform task panicked or was cancelled.
    #[error("transform task failed: {0}")]
    Join(String),
}

/// Pipeline error seen at the request boundary.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// Fetching the object failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Transforming the object failed.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl EdgeError {
    /// HTTP status code for this error: 404 for a missing object, 500 for
    /// everything else.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Store(StoreError::NotFound { .. }) => 404,
            _ => 500,
        }
    }

    /// Whether the error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound { .. }))
    }
}

/// Convenience result type for pipeline operations.
pub type EdgeResult<T> = Result<T, EdgeError>;
