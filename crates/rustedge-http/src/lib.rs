//! HTTP layer for the RustEdge delivery endpoint.
//!
//! - **Request** ([`request`]): classifies method and path into an
//!   [`EdgeRoute`](request::EdgeRoute) and decodes the storage key.
//! - **Response** ([`response`]): cache, CORS and content headers, plus the
//!   fixed error, preflight and health responses.
//! - **Body** ([`body`]): the [`EdgeResponseBody`](body::EdgeResponseBody)
//!   type, including the streaming wrapper that owns the store stream.
//! - **Service** ([`service`]): [`EdgeHttpService`](service::EdgeHttpService),
//!   the hyper `Service` tying it together.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> EdgeHttpService (hyper Service)
//!     -> Health check / CORS preflight / method filter
//!     -> ObjectStore::get_object
//!     -> decide: passthrough stream | Transformer
//!     -> Common response headers (CORS, X-Request-Id)
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use rustedge_core::MemoryObjectStore;
//! use rustedge_http::service::{EdgeHttpConfig, EdgeHttpService};
//!
//! let service = EdgeHttpService::new(MemoryObjectStore::new(), EdgeHttpConfig::default());
//! // Use `service` with hyper server.
//! ```

pub mod body;
pub mod request;
pub mod response;
pub mod service;

pub use body::{EdgeResponseBody, ObjectStreamBody};
pub use request::{EdgeRoute, ObjectRequest};
pub use service::{EdgeHttpConfig, EdgeHttpService};
