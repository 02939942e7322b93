//! Integration tests for the RustEdge server.
//!
//! These tests require a running `rustedge-server` (default
//! `http://localhost:8080`, override with `EDGE_URL`) backed by an
//! S3-compatible endpoint (default `http://localhost:4566`, override with
//! `S3_ENDPOINT_URL`). Objects are seeded into `EDGE_BUCKET` (default
//! `assets`) through the S3 API. The tests are marked `#[ignore]` so they
//! don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p rustedge-integration -- --ignored
//! ```

use std::io::Cursor;
use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the S3-compatible store.
fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Base URL of the edge server.
#[must_use]
pub fn edge_url() -> String {
    std::env::var("EDGE_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Bucket the edge server reads from.
#[must_use]
pub fn edge_bucket() -> String {
    std::env::var("EDGE_BUCKET").unwrap_or_else(|_| "assets".to_owned())
}

/// Create a configured S3 client pointing at the local store.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Create an HTTP client for talking to the edge server.
#[must_use]
pub fn http_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Generate a unique key for a test, so runs never collide.
#[must_use]
pub fn test_key(prefix: &str, name: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}/{name}")
}

/// Make sure the edge bucket exists. An "already exists" answer is fine.
pub async fn ensure_bucket(client: &aws_sdk_s3::Client) -> String {
    let bucket = edge_bucket();
    if client.head_bucket().bucket(&bucket).send().await.is_err() {
        let _ = client.create_bucket().bucket(&bucket).send().await;
    }
    bucket
}

/// Upload an object into the edge bucket.
pub async fn put_object(client: &aws_sdk_s3::Client, key: &str, data: Vec<u8>, content_type: &str) {
    let bucket = ensure_bucket(client).await;
    client
        .put_object()
        .bucket(&bucket)
        .key(key)
        .content_type(content_type)
        .body(ByteStream::from(data))
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to put {key}: {e}"));
}

/// Remove an object from the edge bucket.
pub async fn delete_object(client: &aws_sdk_s3::Client, key: &str) {
    let _ = client
        .delete_object()
        .bucket(edge_bucket())
        .key(key)
        .send()
        .await;
}

/// Encode a gradient PNG of the given size.
#[must_use]
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            u8::try_from(x % 256).unwrap_or(0),
            u8::try_from(y % 256).unwrap_or(0),
            200,
        ])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png fixture");
    buf.into_inner()
}

/// Build the edge URL for a key plus an optional query string.
#[must_use]
pub fn object_url(key: &str, query: &str) -> String {
    if query.is_empty() {
        format!("{}/{key}", edge_url())
    } else {
        format!("{}/{key}?{query}", edge_url())
    }
}

mod test_cors;
mod test_error;
mod test_passthrough;
mod test_transform;
