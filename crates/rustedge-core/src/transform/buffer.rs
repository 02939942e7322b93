//! Materialization of a transform input.
//!
//! Decoding needs the whole image, so the object body is drained into a
//! [`TransformInput`] first. Inputs up to [`BufferLimits::max_memory`] stay in
//! memory; larger ones spill to an anonymous temporary file (the [`tempfile`]
//! crate unlinks it immediately, so the data disappears when the handle is
//! dropped). Inputs above [`BufferLimits::max_input`] are rejected while
//! reading, without draining the rest of the stream.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek, SeekFrom};

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::{DEFAULT_TRANSFORM_MAX_INPUT_SIZE, DEFAULT_TRANSFORM_MAX_MEMORY_SIZE};
use crate::error::{EdgeResult, TransformError};
use crate::object::ObjectBody;

/// Size limits applied while materializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLimits {
    /// Bytes kept in memory before spilling to disk.
    pub max_memory: usize,
    /// Bytes accepted in total.
    pub max_input: u64,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            max_memory: DEFAULT_TRANSFORM_MAX_MEMORY_SIZE,
            max_input: DEFAULT_TRANSFORM_MAX_INPUT_SIZE,
        }
    }
}

/// A fully read transform input.
#[derive(Debug)]
pub enum TransformInput {
    /// The whole input in memory.
    Memory(Bytes),
    /// The input spilled to an anonymous temporary file.
    Spilled {
        /// Handle to the unlinked temp file.
        file: File,
        /// Number of bytes written.
        len: u64,
    },
}

impl TransformInput {
    /// Number of bytes held.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Memory(data) => data.len() as u64,
            Self::Spilled { len, .. } => *len,
        }
    }

    /// Whether no bytes were read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the input was spilled to disk.
    #[must_use]
    pub fn is_spilled(&self) -> bool {
        matches!(self, Self::Spilled { .. })
    }

    /// Decode the image, returning it upright with its detected format.
    ///
    /// The EXIF orientation, when present, is applied to the pixels, since
    /// re-encoding drops the metadata that carried it.
    ///
    /// Blocking; run it off the async executor. Consumes the input, so the
    /// buffer or temp file is released as soon as decoding finishes.
    pub fn decode(self) -> Result<(DynamicImage, ImageFormat), TransformError> {
        match self {
            Self::Memory(data) => decode_from(ImageReader::new(Cursor::new(data.as_ref()))),
            Self::Spilled { mut file, .. } => {
                file.seek(SeekFrom::Start(0))?;
                decode_from(ImageReader::new(BufReader::new(file)))
            }
        }
    }
}

fn decode_from<R: BufRead + Seek>(
    reader: ImageReader<R>,
) -> Result<(DynamicImage, ImageFormat), TransformError> {
    let reader = reader
        .with_guessed_format()
        .map_err(|e| TransformError::Decode(format!("failed to guess format: {e}")))?;
    let format = reader
        .format()
        .ok_or_else(|| TransformError::Decode("unrecognized image format".to_owned()))?;

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| TransformError::Decode(e.to_string()))?;
    // Unreadable EXIF is treated as no orientation.
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut image =
        DynamicImage::from_decoder(decoder).map_err(|e| TransformError::Decode(e.to_string()))?;
    if orientation != Orientation::NoTransforms {
        debug!(?orientation, "applying EXIF orientation");
        image.apply_orientation(orientation);
    }
    Ok((image, format))
}

/// Drain `body` into a [`TransformInput`].
///
/// Store errors raised by the body surface as [`EdgeError::Store`](crate::error::EdgeError::Store).
pub async fn materialize(mut body: ObjectBody, limits: BufferLimits) -> EdgeResult<TransformInput> {
    let mut memory = BytesMut::new();
    let mut spill: Option<(File, tokio::fs::File)> = None;
    let mut total: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        total += chunk.len() as u64;
        if total > limits.max_input {
            return Err(TransformError::InputTooLarge {
                size: total,
                max: limits.max_input,
            }
            .into());
        }

        if let Some((_, writer)) = spill.as_mut() {
            writer.write_all(&chunk).await.map_err(TransformError::from)?;
        } else if memory.len() + chunk.len() > limits.max_memory {
            debug!(bytes = total, "spilling transform input to a temporary file");
            let file = tempfile::tempfile().map_err(TransformError::from)?;
            let mut writer = tokio::fs::File::from_std(file.try_clone().map_err(TransformError::from)?);
            writer.write_all(&memory).await.map_err(TransformError::from)?;
            writer.write_all(&chunk).await.map_err(TransformError::from)?;
            memory = BytesMut::new();
            spill = Some((file, writer));
        } else {
            memory.extend_from_slice(&chunk);
        }
    }

    match spill {
        Some((file, mut writer)) => {
            writer.flush().await.map_err(TransformError::from)?;
            Ok(TransformInput::Spilled { file, len: total })
        }
        None => Ok(TransformInput::Memory(memory.freeze())),
    }
}
