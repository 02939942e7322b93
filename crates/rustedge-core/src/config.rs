//! Edge endpoint configuration.
//!
//! Provides [`EdgeConfig`], the single immutable configuration value built once
//! at startup and shared (read-only) by every request. Values are loaded from
//! environment variables with sensible defaults; store credentials are left to
//! the standard AWS provider chain.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default JPEG quality used when a request does not carry `q`.
pub const DEFAULT_QUALITY: u8 = 80;

/// Default upper bound applied to requested widths and heights.
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;

/// Largest resize output, in pixels. Derived sides are scaled down to stay
/// under it.
pub const MAX_OUTPUT_PIXELS: u64 = 16 * 1024 * 1024;

/// Default chunk size (in bytes) used when copying passthrough bodies.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Default size (in bytes) a transform input may occupy in memory before it
/// spills to a temporary file.
pub const DEFAULT_TRANSFORM_MAX_MEMORY_SIZE: usize = 8 * 1024 * 1024;

/// Default largest object (in bytes) accepted as transform input.
pub const DEFAULT_TRANSFORM_MAX_INPUT_SIZE: u64 = 64 * 1024 * 1024;

/// Which [`ObjectStore`](crate::store::ObjectStore) backend serves objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// An S3-compatible endpoint reached through `aws-sdk-s3`.
    #[default]
    S3,
    /// The process-local [`MemoryObjectStore`](crate::store::MemoryObjectStore).
    Memory,
}

impl StoreKind {
    /// Parse a store kind, returning `None` for unknown values.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" => Some(Self::S3),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Edge endpoint configuration.
///
/// # Examples
///
/// ```
/// use rustedge_core::config::EdgeConfig;
///
/// let config = EdgeConfig::builder().bucket("media".into()).build();
/// assert_eq!(config.bucket, "media");
/// assert_eq!(config.default_quality, 80);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConfig {
    /// Bind address for the HTTP listener (e.g. `"0.0.0.0:8080"`).
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Store backend.
    #[builder(default)]
    pub store: StoreKind,

    /// The single bucket objects are served from.
    #[builder(default = String::from("assets"))]
    pub bucket: String,

    /// Region handed to the S3 client.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,

    /// Custom S3 endpoint (R2, MinIO, LocalStack, ...).
    #[builder(default)]
    pub endpoint_url: Option<String>,

    /// Use path-style bucket addressing instead of virtual-hosted style.
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Extra CA bundle the TLS stack must trust when talking to the store.
    #[builder(default)]
    pub ca_bundle_path: Option<String>,

    /// Quality used when a request does not specify `q`.
    #[builder(default = DEFAULT_QUALITY)]
    pub default_quality: u8,

    /// Requested dimensions above this value are clamped to it.
    #[builder(default = DEFAULT_MAX_DIMENSION)]
    pub max_dimension: u32,

    /// Size of each chunk written to the client on passthrough.
    #[builder(default = DEFAULT_STREAM_CHUNK_SIZE)]
    pub stream_chunk_size: usize,

    /// Transform inputs larger than this spill to a temporary file.
    #[builder(default = DEFAULT_TRANSFORM_MAX_MEMORY_SIZE)]
    pub transform_max_memory_size: usize,

    /// Transform inputs larger than this are rejected.
    #[builder(default = DEFAULT_TRANSFORM_MAX_INPUT_SIZE)]
    pub transform_max_input_size: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Log output format.
    #[builder(default)]
    pub log_format: LogFormat,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EdgeConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `EDGE_STORE` | `s3` |
    /// | `EDGE_BUCKET` | `assets` |
    /// | `AWS_REGION` / `DEFAULT_REGION` | `us-east-1` |
    /// | `S3_ENDPOINT_URL` | *(unset)* |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    /// | `EDGE_CA_BUNDLE` | *(unset)* |
    /// | `EDGE_DEFAULT_QUALITY` | `80` |
    /// | `EDGE_MAX_DIMENSION` | `4096` |
    /// | `EDGE_STREAM_CHUNK_SIZE` | `65536` |
    /// | `EDGE_TRANSFORM_MAX_MEMORY` | `8388608` |
    /// | `EDGE_TRANSFORM_MAX_INPUT` | `67108864` |
    /// | `LOG_LEVEL` | `info` |
    /// | `LOG_FORMAT` | `text` |
    ///
    /// Unparseable or out-of-range numbers keep their default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(kind) = lookup("EDGE_STORE").as_deref().and_then(StoreKind::parse) {
            config.store = kind;
        }
        if let Some(v) = lookup("EDGE_BUCKET") {
            config.bucket = v;
        }
        if let Some(v) = lookup("AWS_REGION").or_else(|| lookup("DEFAULT_REGION")) {
            config.region = v;
        }
        config.endpoint_url = lookup("S3_ENDPOINT_URL").filter(|v| !v.is_empty());
        if let Some(v) = lookup("S3_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }
        config.ca_bundle_path = lookup("EDGE_CA_BUNDLE").filter(|v| !v.is_empty());
        if let Some(q) = lookup("EDGE_DEFAULT_QUALITY").and_then(|v| v.parse::<u8>().ok()) {
            if (1..=100).contains(&q) {
                config.default_quality = q;
            }
        }
        if let Some(n) = parse_positive(lookup("EDGE_MAX_DIMENSION")) {
            config.max_dimension = n;
        }
        if let Some(n) = parse_positive(lookup("EDGE_STREAM_CHUNK_SIZE")) {
            config.stream_chunk_size = n;
        }
        if let Some(n) = parse_positive(lookup("EDGE_TRANSFORM_MAX_MEMORY")) {
            config.transform_max_memory_size = n;
        }
        if let Some(n) = parse_positive(lookup("EDGE_TRANSFORM_MAX_INPUT")) {
            config.transform_max_input_size = n;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            config.log_format = if v.eq_ignore_ascii_case("json") {
                LogFormat::Json
            } else {
                LogFormat::Text
            };
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn parse_positive<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|n| *n > T::default())
}
