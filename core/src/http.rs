//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! client builds `HttpRequest` values and decodes `HttpResponse` values; a
//! `Transport` performs the actual I/O in between. Keeping the descriptor
//! as data lets tests assert on the exact URL, headers and body a call
//! would send without a network.
//!
//! All fields use owned types (`String`, `Vec`, `Bytes`) so values can be
//! moved into blocking tasks or cloned for a retry without lifetime concerns.

use std::fmt;

use bytes::Bytes;

use crate::encode;
use crate::form::FormData;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Case-insensitive lookup; `None` for methods this client never sends.
    pub fn parse(method: &str) -> Option<Self> {
        [Self::Get, Self::Post, Self::Put, Self::Delete]
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(method))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload, kept structured until the transport needs bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` text.
    UrlEncoded(String),
    /// `multipart/form-data` with the boundary already announced in the
    /// request's Content-Type header.
    Multipart { form: FormData, boundary: String },
}

impl RequestBody {
    /// Wire bytes for this body.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            RequestBody::UrlEncoded(s) => Bytes::copy_from_slice(s.as_bytes()),
            RequestBody::Multipart { form, boundary } => encode::encode_multipart(form, boundary),
        }
    }

    pub fn as_form(&self) -> Option<&FormData> {
        match self {
            RequestBody::Multipart { form, .. } => Some(form),
            RequestBody::UrlEncoded(_) => None,
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `AjaxClient::build_*` methods and executed by a `Transport`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Whether the transport may attach ambient credentials (stored cookies).
    pub with_credentials: bool,
}

impl HttpRequest {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// Produced by a `Transport`, then handed to the decoder.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
