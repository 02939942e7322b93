//! Request classification.
//!
//! Maps method and path to an [`EdgeRoute`]. The path (minus its leading `/`)
//! is percent-decoded into the storage key and otherwise left alone.
//!
//! [`HEALTH_CHECK_PATH`] is reserved: `GET` and `HEAD` on it never reach the
//! store, so the key `_edge/health` cannot be served.

use percent_encoding::percent_decode_str;
use rustedge_core::{TransformLimits, TransformRequest};

/// Path answered by the built-in health check.
pub const HEALTH_CHECK_PATH: &str = "/_edge/health";

/// Methods the endpoint serves, as advertised in `Allow`.
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// What a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeRoute {
    /// `GET` or `HEAD` of [`HEALTH_CHECK_PATH`].
    HealthCheck {
        /// Whether only headers were asked for.
        head_only: bool,
    },
    /// CORS preflight for any path.
    Preflight,
    /// `GET` or `HEAD` of an object.
    Object(ObjectRequest),
    /// `GET` or `HEAD` of a path that cannot name an object.
    InvalidKey,
    /// Any other method.
    MethodNotAllowed,
}

/// A request for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRequest {
    /// Decoded storage key.
    pub key: String,
    /// Whether only headers were asked for.
    pub head_only: bool,
    /// Requested resize.
    pub transform: TransformRequest,
}

/// Classify a request.
#[must_use]
pub fn classify(parts: &http::request::Parts, limits: TransformLimits) -> EdgeRoute {
    let method = &parts.method;
    let path = parts.uri.path();

    if *method == http::Method::OPTIONS {
        return EdgeRoute::Preflight;
    }
    if *method != http::Method::GET && *method != http::Method::HEAD {
        return EdgeRoute::MethodNotAllowed;
    }
    let head_only = *method == http::Method::HEAD;
    if path == HEALTH_CHECK_PATH {
        return EdgeRoute::HealthCheck { head_only };
    }

    match object_key(path) {
        Some(key) => EdgeRoute::Object(ObjectRequest {
            key,
            head_only,
            transform: TransformRequest::from_query(parts.uri.query(), limits),
        }),
        None => EdgeRoute::InvalidKey,
    }
}

/// Turn a request path into a storage key.
///
/// Returns `None` for an empty key or one that does not decode to UTF-8.
#[must_use]
pub fn object_key(path: &str) -> Option<String> {
    let raw = path.strip_prefix('/').unwrap_or(path);
    let key = percent_decode_str(raw).decode_utf8().ok()?;
    (!key.is_empty()).then(|| key.into_owned())
}
