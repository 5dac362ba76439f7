//! Typed request-builder for the deployment dashboard's REST backend.
//!
//! # Overview
//! Every backend operation is an `EndpointSpec`: an HTTP method, a URL
//! template (literal or computed from path parameters) and the body, path and
//! response types. Binding a spec to an `ApiClient` yields an `Endpoint`, the
//! endpoint function, which performs one HTTP round trip per invocation.
//!
//! # Design
//! - Request construction (`EndpointSpec::build_request`) and response
//!   normalization (`parse_response`) are pure; only a `Transport` does I/O.
//! - `Endpoint::call` (future) and `Endpoint::call_with` (callback) share one
//!   execution path, so headers, timeout and error shapes never diverge.
//! - Failures are always one of four `ApiError` kinds: `Construction`,
//!   `Network`, `RequestFailed`, `Decode`. Nothing is retried.
//! - The bearer token is an explicit argument of every invocation; an empty
//!   token sends no `Authorization` header and relies on the session cookie.
//! - `catalog` declares the dashboard's operations as `const` specs.

pub mod catalog;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod response;
pub mod transport;
pub mod types;

pub use client::{ApiClient, ApiResult, Endpoint};
pub use config::ClientConfig;
pub use endpoint::{encode_segment, EndpointSpec, UrlTemplate};
pub use error::{ApiError, ConfigError, ErrorBody, ErrorKind, NetworkErrorKind, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use response::{parse_response, Response};
pub use transport::{ReqwestTransport, Transport};
