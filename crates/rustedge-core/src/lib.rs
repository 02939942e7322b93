//! Fetch and transform core for the RustEdge delivery endpoint.
//!
//! This crate knows nothing about HTTP. It fetches objects from a blob store,
//! decides whether a request asks for a resized image, and produces the
//! resized bytes. The HTTP crate turns the results into responses.
//!
//! # Architecture
//!
//! ```text
//! TransformRequest (w / h / q)
//!        |
//!        v
//! ObjectStore::get_object --> FetchedObject (meta + body stream)
//!        |
//!        v
//! decide() --Passthrough--> body stream, untouched
//!        |
//!     Transform
//!        v
//! Transformer (buffer -> decode -> resize -> encode) --> TransformedObject
//! ```

pub mod config;
pub mod error;
pub mod object;
pub mod params;
pub mod store;
pub mod transform;

pub use config::EdgeConfig;
pub use error::{EdgeError, EdgeResult, StoreError, TransformError};
pub use object::{FetchedObject, ObjectBody, ObjectMeta, TransformedObject};
pub use params::{TransformLimits, TransformRequest};
pub use store::{MemoryObjectStore, ObjectStore, S3ObjectStore};
pub use transform::{OutputBounds, TransformDecision, Transformer, decide};
