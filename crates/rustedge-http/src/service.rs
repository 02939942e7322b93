//! The edge HTTP service implementing hyper's `Service` trait.
//!
//! [`EdgeHttpService`] runs one request through the pipeline:
//!
//! 1. Health check interception (`GET /_edge/health`)
//! 2. CORS preflight (`OPTIONS`), answered without touching the store
//! 3. Method filtering and key decoding
//! 4. Object fetch from the [`ObjectStore`]
//! 5. Passthrough or transform, per [`decide`]
//! 6. Common response headers (CORS, `X-Request-Id`)
//!
//! Every failure is turned into a response here; nothing propagates past
//! [`EdgeHttpService::handle`].

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::service::Service;
use tracing::{debug, error, info};
use uuid::Uuid;

use rustedge_core::object::bounded_chunks;
use rustedge_core::{
    EdgeConfig, EdgeError, EdgeResult, ObjectStore, TransformDecision, TransformLimits,
    Transformer, decide,
};

use crate::body::{EdgeResponseBody, ObjectStreamBody};
use crate::request::{EdgeRoute, ObjectRequest, classify};
use crate::response::{
    add_common_headers, error_response, health_check_response, method_not_allowed_response,
    not_found_response, object_response, preflight_response,
};

/// Configuration for the edge HTTP service.
#[derive(Debug, Clone)]
pub struct EdgeHttpConfig {
    /// Bucket every key is resolved in.
    pub bucket: String,
    /// Bounds for query parameter parsing.
    pub limits: TransformLimits,
    /// Largest chunk written per frame on passthrough.
    pub stream_chunk_size: usize,
    /// Resize runner.
    pub transformer: Transformer,
}

impl Default for EdgeHttpConfig {
    fn default() -> Self {
        Self::from(&EdgeConfig::default())
    }
}

impl From<&EdgeConfig> for EdgeHttpConfig {
    fn from(config: &EdgeConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            limits: TransformLimits::from(config),
            stream_chunk_size: config.stream_chunk_size.max(1),
            transformer: Transformer::from_config(config),
        }
    }
}

/// The edge HTTP service.
///
/// # Type Parameters
///
/// - `S`: The blob backend implementing [`ObjectStore`].
#[derive(Debug)]
pub struct EdgeHttpService<S: ObjectStore> {
    store: Arc<S>,
    config: Arc<EdgeHttpConfig>,
}

impl<S: ObjectStore> EdgeHttpService<S> {
    /// Create a new service with the given store and configuration.
    #[must_use]
    pub fn new(store: S, config: EdgeHttpConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create a new service from an `Arc<S>` store and configuration.
    #[must_use]
    pub fn from_shared(store: Arc<S>, config: EdgeHttpConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// The service configuration.
    #[must_use]
    pub fn config(&self) -> &EdgeHttpConfig {
        &self.config
    }

    /// Produce the response for a request, without the common headers.
    pub async fn handle(
        &self,
        parts: &http::request::Parts,
        request_id: &str,
    ) -> http::Response<EdgeResponseBody> {
        let path = parts.uri.path();
        match classify(parts, self.config.limits) {
            EdgeRoute::HealthCheck { head_only } => {
                let response = health_check_response();
                if head_only {
                    response.map(|_| EdgeResponseBody::empty())
                } else {
                    response
                }
            }
            EdgeRoute::Preflight => {
                debug!(path, request_id, "answering CORS preflight");
                preflight_response()
            }
            EdgeRoute::MethodNotAllowed => {
                debug!(method = %parts.method, path, request_id, "method not allowed");
                method_not_allowed_response()
            }
            EdgeRoute::InvalidKey => {
                debug!(path, request_id, "path does not name an object");
                not_found_response()
            }
            EdgeRoute::Object(request) => {
                let key = request.key.clone();
                match self.serve_object(request, request_id).await {
                    Ok(response) => response,
                    Err(err) => {
                        log_failure(&err, &key, &self.config.bucket, request_id);
                        error_response(&err)
                    }
                }
            }
        }
    }

    async fn serve_object(
        &self,
        request: ObjectRequest,
        request_id: &str,
    ) -> EdgeResult<http::Response<EdgeResponseBody>> {
        let object = self
            .store
            .get_object(&self.config.bucket, &request.key)
            .await?;
        let decision = decide(object.content_type.as_deref(), &request.transform);
        info!(
            key = %request.key,
            request_id,
            ?decision,
            head = request.head_only,
            "serving object"
        );

        let (meta, body) = object.into_parts();
        match decision {
            TransformDecision::Passthrough => {
                let body = if request.head_only {
                    drop(body);
                    EdgeResponseBody::empty()
                } else {
                    EdgeResponseBody::streaming(ObjectStreamBody::new(
                        bounded_chunks(body, self.config.stream_chunk_size),
                        meta.size,
                        meta.key.as_str(),
                        request_id,
                    ))
                };
                Ok(object_response(
                    &meta,
                    meta.content_type_or_default(),
                    meta.size,
                    body,
                ))
            }
            TransformDecision::Transform => {
                let transformed = self
                    .config
                    .transformer
                    .transform(body, request.transform)
                    .await?;
                let len = transformed.bytes.len() as u64;
                let body = if request.head_only {
                    EdgeResponseBody::empty()
                } else {
                    EdgeResponseBody::from_bytes(transformed.bytes)
                };
                Ok(object_response(&meta, &transformed.mime_type, Some(len), body))
            }
        }
    }
}

fn log_failure(err: &EdgeError, key: &str, bucket: &str, request_id: &str) {
    let status = err.status();
    if err.is_not_found() {
        debug!(key, bucket, request_id, status, "object not found");
    } else {
        error!(key, bucket, request_id, status, error = %err, "request failed");
    }
}

impl<S: ObjectStore> Clone for EdgeHttpService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, B> Service<http::Request<B>> for EdgeHttpService<S>
where
    S: ObjectStore,
    B: Send + 'static,
{
    type Response = http::Response<EdgeResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let (parts, _) = req.into_parts();

            let response = service.handle(&parts, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}
