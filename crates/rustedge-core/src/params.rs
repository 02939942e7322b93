//! Transform request parsing.
//!
//! Query parameters `w`, `h` and `q` become a [`TransformRequest`]. Parsing
//! never fails: a dimension that is absent, unparseable, zero or negative is
//! simply "not requested", and quality is clamped into `1..=100`.

use crate::config::{DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY, EdgeConfig};

/// Lowest accepted quality.
pub const MIN_QUALITY: u8 = 1;

/// Highest accepted quality.
pub const MAX_QUALITY: u8 = 100;

/// Bounds applied while parsing a [`TransformRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformLimits {
    /// Quality used when `q` is absent or unparseable.
    pub default_quality: u8,
    /// Dimensions above this are clamped to it.
    pub max_dimension: u32,
}

impl Default for TransformLimits {
    fn default() -> Self {
        Self {
            default_quality: DEFAULT_QUALITY,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl From<&EdgeConfig> for TransformLimits {
    fn from(config: &EdgeConfig) -> Self {
        Self {
            default_quality: config.default_quality.clamp(MIN_QUALITY, MAX_QUALITY),
            max_dimension: config.max_dimension.max(1),
        }
    }
}

/// Requested output size and quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformRequest {
    /// Target width in pixels.
    pub width: Option<u32>,
    /// Target height in pixels.
    pub height: Option<u32>,
    /// Encoder quality, always within `1..=100`.
    pub quality: u8,
}

impl Default for TransformRequest {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl TransformRequest {
    /// Create a request, clamping quality into range and dropping zero sizes.
    #[must_use]
    pub fn new(width: Option<u32>, height: Option<u32>, quality: u8) -> Self {
        Self {
            width: width.filter(|w| *w > 0),
            height: height.filter(|h| *h > 0),
            quality: quality.clamp(MIN_QUALITY, MAX_QUALITY),
        }
    }

    /// Parse a raw (still percent-encoded) query string.
    ///
    /// Unknown parameters are ignored; when a parameter repeats, the last
    /// occurrence wins.
    #[must_use]
    pub fn from_query(query: Option<&str>, limits: TransformLimits) -> Self {
        let mut width = None;
        let mut height = None;
        let mut quality = None;

        for (name, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match name.as_ref() {
                "w" => width = parse_dimension(&value, limits.max_dimension),
                "h" => height = parse_dimension(&value, limits.max_dimension),
                "q" => quality = parse_quality(&value),
                _ => {}
            }
        }

        Self {
            width,
            height,
            quality: quality.unwrap_or(limits.default_quality),
        }
    }

    /// Whether at least one target dimension was requested.
    #[must_use]
    pub fn has_dimensions(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

fn parse_dimension(value: &str, max_dimension: u32) -> Option<u32> {
    let n = value.trim().parse::<i64>().ok().filter(|n| *n > 0)?;
    Some(u32::try_from(n).map_or(max_dimension, |n| n.min(max_dimension)))
}

fn parse_quality(value: &str) -> Option<u8> {
    let n = value.trim().parse::<i64>().ok()?;
    let clamped = n.clamp(i64::from(MIN_QUALITY), i64::from(MAX_QUALITY));
    u8::try_from(clamped).ok()
}
