//! Image transformation.
//!
//! [`decide`] picks between passthrough and resize for a fetched object.
//! [`Transformer`] runs the resize: it drains the body (see [`buffer`]), then
//! decodes, resizes and re-encodes on the blocking pool (see [`codec`]).

pub mod buffer;
pub mod codec;
pub mod dimensions;

use crate::config::EdgeConfig;
use crate::error::{EdgeResult, TransformError};
use crate::object::{ObjectBody, TransformedObject};
use crate::params::TransformRequest;

pub use buffer::{BufferLimits, TransformInput};
pub use dimensions::{OutputBounds, fit_dimensions, target_dimensions};

/// What to do with a fetched object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformDecision {
    /// Stream the original bytes untouched.
    Passthrough,
    /// Resize and re-encode.
    Transform,
}

/// Transform only images for which a target size was requested.
///
/// A missing content type never transforms.
#[must_use]
pub fn decide(content_type: Option<&str>, request: &TransformRequest) -> TransformDecision {
    match content_type {
        Some(ct) if ct.starts_with("image/") && request.has_dimensions() => {
            TransformDecision::Transform
        }
        _ => TransformDecision::Passthrough,
    }
}

/// Runs resize jobs off the async executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformer {
    limits: BufferLimits,
    bounds: OutputBounds,
}

impl Transformer {
    /// Create a transformer with explicit buffering limits and output bounds.
    #[must_use]
    pub fn new(limits: BufferLimits, bounds: OutputBounds) -> Self {
        Self { limits, bounds }
    }

    /// Create a transformer from the gateway configuration.
    #[must_use]
    pub fn from_config(config: &EdgeConfig) -> Self {
        Self::new(
            BufferLimits {
                max_memory: config.transform_max_memory_size,
                max_input: config.transform_max_input_size,
            },
            OutputBounds::from(config),
        )
    }

    /// Buffering limits in use.
    #[must_use]
    pub fn limits(&self) -> BufferLimits {
        self.limits
    }

    /// Output size limits in use.
    #[must_use]
    pub fn bounds(&self) -> OutputBounds {
        self.bounds
    }

    /// Consume `body` and produce the resized image.
    ///
    /// The body is fully drained (and dropped) before decoding starts; the
    /// intermediate buffer is released once the encoded bytes exist.
    pub async fn transform(
        &self,
        body: ObjectBody,
        request: TransformRequest,
    ) -> EdgeResult<TransformedObject> {
        let input = buffer::materialize(body, self.limits).await?;
        let bounds = self.bounds;
        let job = tokio::task::spawn_blocking(move || codec::resize(input, &request, bounds));
        let transformed = job
            .await
            .map_err(|e| TransformError::Join(e.to_string()))??;
        Ok(transformed)
    }
}
