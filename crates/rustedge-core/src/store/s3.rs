//! S3-compatible store backed by `aws-sdk-s3`.

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use tracing::debug;

use super::ObjectStore;
use crate::config::EdgeConfig;
use crate::error::StoreError;
use crate::object::{FetchedObject, ObjectBody};

/// Build an S3 client for the configured region and endpoint.
///
/// Credentials come from the default AWS provider chain. TLS roots follow
/// `SSL_CERT_FILE` when the process exported one before starting.
pub async fn build_s3_client(config: &EdgeConfig) -> aws_sdk_s3::Client {
    let shared = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;

    let mut builder =
        aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.force_path_style);
    if let Some(endpoint) = &config.endpoint_url {
        builder = builder.endpoint_url(endpoint);
    }

    aws_sdk_s3::Client::from_conf(builder.build())
}

/// [`ObjectStore`] over an S3 client.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build the client from configuration and wrap it.
    pub async fn from_config(config: &EdgeConfig) -> Self {
        Self::new(build_s3_client(config).await)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<FetchedObject, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_get_object_error(key, &e))?;

        let content_type = output.content_type().map(str::to_owned);
        let etag = output.e_tag().map(str::to_owned);
        let last_modified = output.last_modified().and_then(|t| to_chrono(t.secs(), t.subsec_nanos()));
        let size = output.content_length().and_then(|n| u64::try_from(n).ok());
        debug!(bucket, key, ?content_type, ?size, "fetched object");

        Ok(FetchedObject {
            key: key.to_owned(),
            content_type,
            etag,
            last_modified,
            size,
            body: byte_stream_body(output.body),
        })
    }
}

fn map_get_object_error(key: &str, err: &SdkError<GetObjectError>) -> StoreError {
    let not_found = matches!(
        err,
        SdkError::ServiceError(ctx) if matches!(ctx.err(), GetObjectError::NoSuchKey(_))
    ) || err.raw_response().is_some_and(|r| r.status().as_u16() == 404);

    if not_found {
        StoreError::NotFound {
            key: key.to_owned(),
        }
    } else {
        StoreError::unavailable(DisplayErrorContext(err).to_string())
    }
}

fn to_chrono(secs: i64, nanos: u32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, nanos)
}

/// Adapt the SDK body into an [`ObjectBody`]. Dropping the stream drops the
/// underlying connection.
fn byte_stream_body(body: ByteStream) -> ObjectBody {
    stream::unfold(body, |mut body| async move {
        let item = body.next().await?;
        Some((item.map_err(|e| StoreError::unavailable(e.to_string())), body))
    })
    .boxed()
}
