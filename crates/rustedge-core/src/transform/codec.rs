//! Resize and re-encode.
//!
//! The output keeps the source format. Quality only affects the JPEG
//! encoder; PNG, GIF and WebP are written losslessly.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use super::buffer::TransformInput;
use super::dimensions::{OutputBounds, fit_dimensions};
use crate::error::TransformError;
use crate::object::TransformedObject;
use crate::params::TransformRequest;

/// Decode `input`, resize it per `request` within `bounds` and re-encode it.
///
/// Geometry is computed on the upright image, after EXIF orientation.
/// Blocking; call from [`tokio::task::spawn_blocking`].
pub fn resize(
    input: TransformInput,
    request: &TransformRequest,
    bounds: OutputBounds,
) -> Result<TransformedObject, TransformError> {
    let (image, format) = input.decode()?;
    let (src_w, src_h) = (image.width(), image.height());
    let (width, height) = fit_dimensions(src_w, src_h, request.width, request.height, bounds);

    let resized = if (width, height) == (src_w, src_h) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    };

    let bytes = encode(&resized, format, request.quality)?;
    debug!(
        format = ?format,
        src_w,
        src_h,
        width,
        height,
        bytes = bytes.len(),
        "image resized"
    );

    Ok(TransformedObject {
        mime_type: format.to_mime_type().to_owned(),
        bytes: Bytes::from(bytes),
    })
}

/// Encode `image` in `format`.
pub fn encode(image: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, TransformError> {
    let mut buf = Vec::new();
    let result = match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            image.to_rgb8().write_with_encoder(encoder)
        }
        ImageFormat::WebP => {
            let encoder = WebPEncoder::new_lossless(&mut buf);
            image.to_rgba8().write_with_encoder(encoder)
        }
        other => image.write_to(&mut Cursor::new(&mut buf), other),
    };
    result.map_err(|e| TransformError::Encode(format!("{format:?}: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(format: ImageFormat, width: u32, height: u32) -> TransformInput {
        let image = DynamicImage::new_rgba8(width, height);
        let bytes = encode(&image, format, 90).expect("encode fixture");
        TransformInput::Memory(Bytes::from(bytes))
    }

    fn run(input: TransformInput, request: &TransformRequest) -> TransformedObject {
        resize(input, request, OutputBounds::default()).expect("resize")
    }

    fn dimensions_of(bytes: &[u8]) -> (u32, u32) {
        let image = image::load_from_memory(bytes).expect("decode output");
        (image.width(), image.height())
    }

    #[test]
    fn test_should_resize_png_keeping_format() {
        let request = TransformRequest::new(Some(50), None, 80);
        let out = run(fixture(ImageFormat::Png, 200, 100), &request);
        assert_eq!(out.mime_type, "image/png");
        assert_eq!(dimensions_of(&out.bytes), (50, 25));
    }

    #[test]
    fn test_should_resize_jpeg_with_quality() {
        let request = TransformRequest::new(None, Some(40), 60);
        let out = run(fixture(ImageFormat::Jpeg, 80, 160), &request);
        assert_eq!(out.mime_type, "image/jpeg");
        assert_eq!(dimensions_of(&out.bytes), (20, 40));
    }

    #[test]
    fn test_should_fit_webp_inside_box() {
        let request = TransformRequest::new(Some(30), Some(30), 80);
        let out = run(fixture(ImageFormat::WebP, 60, 120), &request);
        assert_eq!(out.mime_type, "image/webp");
        assert_eq!(dimensions_of(&out.bytes), (15, 30));
    }

    #[test]
    fn test_should_resize_gif() {
        let request = TransformRequest::new(Some(8), None, 80);
        let out = run(fixture(ImageFormat::Gif, 16, 16), &request);
        assert_eq!(out.mime_type, "image/gif");
        assert_eq!(dimensions_of(&out.bytes), (8, 8));
    }

    #[test]
    fn test_should_enlarge_small_images() {
        let request = TransformRequest::new(Some(64), None, 80);
        let out = run(fixture(ImageFormat::Png, 16, 8), &request);
        assert_eq!(dimensions_of(&out.bytes), (64, 32));
    }

    #[test]
    fn test_should_report_decode_failure() {
        let input = TransformInput::Memory(Bytes::from_static(b"\x89PNG\r\n\x1a\ntruncated"));
        let request = TransformRequest::new(Some(10), None, 80);
        assert!(matches!(
            resize(input, &request, OutputBounds::default()),
            Err(TransformError::Decode(_))
        ));
    }

    #[test]
    fn test_should_bound_derived_side_of_thin_strip() {
        let request = TransformRequest::new(Some(4096), None, 80);
        let out = run(fixture(ImageFormat::Png, 1, 2000), &request);
        assert_eq!(dimensions_of(&out.bytes), (2, 4096));
    }

    /// Splice an EXIF APP1 segment carrying `orientation` right after SOI.
    fn with_exif_orientation(jpeg: &[u8], orientation: u8) -> Vec<u8> {
        let mut exif = b"Exif\0\0".to_vec();
        // Big-endian TIFF header, IFD0 at offset 8.
        exif.extend_from_slice(b"MM\0\x2a\0\0\0\x08");
        // One entry: Orientation (0x0112), SHORT, count 1.
        exif.extend_from_slice(&[0x00, 0x01, 0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        exif.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let len = u16::try_from(exif.len() + 2).expect("segment length");
        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&exif);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_should_apply_exif_orientation_before_resizing() {
        let landscape = encode(&DynamicImage::new_rgb8(200, 100), ImageFormat::Jpeg, 90)
            .expect("encode fixture");
        let rotated = with_exif_orientation(&landscape, 6);
        let request = TransformRequest::new(Some(50), None, 80);

        let out = run(TransformInput::Memory(Bytes::from(rotated)), &request);
        assert_eq!(out.mime_type, "image/jpeg");
        assert_eq!(dimensions_of(&out.bytes), (50, 100));
    }
}
