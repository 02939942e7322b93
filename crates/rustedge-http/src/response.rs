//! Response construction.
//!
//! Object responses always carry the immutable cache policy and
//! `Content-Disposition: inline`; `ETag` and `Last-Modified` come from the
//! stored object even when the bytes were transformed. CORS headers are added
//! to every response by [`add_common_headers`].

use http::header::{self, HeaderMap, HeaderValue};
use rustedge_core::EdgeError;
use rustedge_core::object::{FALLBACK_CONTENT_TYPE, ObjectMeta};

use crate::body::EdgeResponseBody;
use crate::request::ALLOWED_METHODS;

/// `Cache-Control` for every object response.
pub const CACHE_CONTROL_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// `Content-Disposition` for every object response.
pub const CONTENT_DISPOSITION_INLINE: &str = "inline";

/// `Access-Control-Allow-Origin` value.
pub const CORS_ALLOW_ORIGIN: &str = "*";

/// `Access-Control-Allow-Methods` value.
pub const CORS_ALLOW_METHODS: &str = ALLOWED_METHODS;

/// `Access-Control-Allow-Headers` value.
pub const CORS_ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept";

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Body of a 404.
pub const NOT_FOUND_BODY: &str = "File not found";

/// Body of a 500.
pub const INTERNAL_ERROR_BODY: &str = "Internal server error";

/// Body of a 405.
pub const METHOD_NOT_ALLOWED_BODY: &str = "Method not allowed";

// ---------------------------------------------------------------------------
// Helper functions for building responses
// ---------------------------------------------------------------------------

/// Set an optional header on a response builder if the value is `Some`.
fn set_optional_header(
    builder: http::response::Builder,
    name: header::HeaderName,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

/// Set an optional HTTP date header from a `DateTime<Utc>`.
fn set_optional_timestamp_header(
    builder: http::response::Builder,
    name: header::HeaderName,
    value: Option<&chrono::DateTime<chrono::Utc>>,
) -> http::response::Builder {
    set_optional_header(
        builder,
        name,
        value
            .map(|v| v.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
            .as_deref(),
    )
}

/// Insert the CORS policy into a header map.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CORS_ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
}

// ---------------------------------------------------------------------------
// Object responses
// ---------------------------------------------------------------------------

/// Build a `200` object response.
///
/// `content_type` is the type of the bytes actually sent (the transformed
/// mime type or the stored one); an unusable value falls back to
/// `application/octet-stream`.
pub fn object_response(
    meta: &ObjectMeta,
    content_type: &str,
    content_length: Option<u64>,
    body: EdgeResponseBody,
) -> http::Response<EdgeResponseBody> {
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));

    let mut builder = http::Response::builder()
        .status(http::StatusCode::OK)
        .header(header::CACHE_CONTROL, CACHE_CONTROL_IMMUTABLE)
        .header(header::CONTENT_DISPOSITION, CONTENT_DISPOSITION_INLINE)
        .header(header::CONTENT_TYPE, content_type);
    builder = set_optional_header(builder, header::ETAG, meta.etag.as_deref());
    builder = set_optional_timestamp_header(builder, header::LAST_MODIFIED, meta.last_modified.as_ref());
    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    builder.body(body).unwrap_or_else(|_| internal_error_response())
}

// ---------------------------------------------------------------------------
// Fixed responses
// ---------------------------------------------------------------------------

fn text_response(
    status: http::StatusCode,
    message: &'static str,
) -> http::Response<EdgeResponseBody> {
    http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::CONTENT_LENGTH, message.len())
        .body(EdgeResponseBody::from_string(message))
        .expect("static text response should be valid")
}

/// `404 File not found`.
#[must_use]
pub fn not_found_response() -> http::Response<EdgeResponseBody> {
    text_response(http::StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

/// `500 Internal server error`.
#[must_use]
pub fn internal_error_response() -> http::Response<EdgeResponseBody> {
    text_response(http::StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY)
}

/// `405 Method not allowed` with an `Allow` header.
#[must_use]
pub fn method_not_allowed_response() -> http::Response<EdgeResponseBody> {
    let mut response = text_response(http::StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_BODY);
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Map a pipeline error to its response.
#[must_use]
pub fn error_response(err: &EdgeError) -> http::Response<EdgeResponseBody> {
    if err.is_not_found() {
        not_found_response()
    } else {
        internal_error_response()
    }
}

/// CORS preflight: `200`, CORS headers, empty body.
#[must_use]
pub fn preflight_response() -> http::Response<EdgeResponseBody> {
    let mut response = http::Response::builder()
        .status(http::StatusCode::OK)
        .header(header::CONTENT_LENGTH, 0)
        .body(EdgeResponseBody::empty())
        .expect("static preflight response should be valid");
    apply_cors_headers(response.headers_mut());
    response
}

/// Health check payload.
#[must_use]
pub fn health_check_response() -> http::Response<EdgeResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(EdgeResponseBody::from_string(r#"{"status":"running"}"#))
        .expect("static health response should be valid")
}

/// Add the headers every response carries: CORS and the request id.
pub fn add_common_headers(
    mut response: http::Response<EdgeResponseBody>,
    request_id: &str,
) -> http::Response<EdgeResponseBody> {
    let headers = response.headers_mut();
    apply_cors_headers(headers);
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, hv);
    }
    response
}
