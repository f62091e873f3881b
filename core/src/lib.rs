//! Small async request client with persistent default headers.
//!
//! # Overview
//! `AjaxClient` exposes `get`, `post`, `put`, `delete` and `upload_file`,
//! all funnelling into one execution routine that sends an `HttpRequest`
//! through a `Transport` and decodes the body by Content-Type. Every call
//! resolves to a `Reply` of `(status, body)`; a failed exchange resolves to
//! status `-1` with a `"<kind>:<message>"` text body instead of an error.
//!
//! # Design
//! - Default headers live in the client, behind a lock, and are copied into
//!   each request when it is built.
//! - Each verb is split into `build_*` (produces a request) and `execute`
//!   (I/O + decode), so request shapes can be tested without a network.
//! - Upload payloads are a closed enum; JSON-described payloads from a
//!   dynamic boundary are validated by `UploadPayload::try_from`.

pub mod client;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod form;
pub mod headers;
pub mod http;
pub mod transport;

pub use client::{AjaxClient, Reply, NETWORK_FAILURE};
pub use config::{ClientConfig, CredentialsPolicy};
pub use decode::{DecodeStrategy, ResponseBody};
pub use encode::UploadPayload;
pub use error::{AjaxError, TransportError};
pub use form::{FileLike, FileList, FormData, FormValue, Params};
pub use headers::HeaderStore;
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use transport::{ReqwestTransport, RetryTransport, Transport};
