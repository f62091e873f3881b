//! Error types for the ajax client.
//!
//! # Design
//! Two failure families are kept apart. `TransportError` means the exchange
//! could not complete; it never reaches the caller as `Err` and is instead
//! folded into a `Reply` with the `-1` status sentinel. `AjaxError` is for
//! caller mistakes (bad upload method, bad upload payload) and invalid
//! configuration, and is always returned as `Err`.
//!
//! HTTP 4xx/5xx statuses are not errors at this layer.

use thiserror::Error;

/// Errors returned as `Err` by `AjaxClient` operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AjaxError {
    /// A caller-supplied argument has the wrong shape or value.
    #[error("{0}")]
    InvalidArgument(String),

    /// The client configuration could not be applied.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A network-level failure: no HTTP status is available.
///
/// Rendered as `<kind>:<message>`, which is the body of the `-1` reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}:{message}")]
pub struct TransportError {
    pub kind: String,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The body could not be decoded according to its declared content type.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new("DecodeError", message)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_connect() {
            "ConnectError"
        } else if e.is_timeout() {
            "TimeoutError"
        } else if e.is_redirect() {
            "RedirectError"
        } else if e.is_body() || e.is_decode() {
            "BodyError"
        } else if e.is_request() || e.is_builder() {
            "RequestError"
        } else {
            "NetworkError"
        };
        Self::new(kind, e.to_string())
    }
}
