//! Network transports.
//!
//! # Design
//! `Transport` is the only I/O seam: the client hands it a fully built
//! `HttpRequest` and gets back either a raw `HttpResponse` (any status) or a
//! `TransportError`. Decoding and the `-1` sentinel live in the client, so a
//! transport never interprets status codes or bodies.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{AjaxError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request/response exchange.
    ///
    /// HTTP error statuses are `Ok`; only a failure to complete the exchange
    /// is `Err`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Transport backed by `reqwest`.
///
/// Requests that allow credentials go through a client with a cookie store;
/// all others go through a client that never stores or sends cookies.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    credentialed: reqwest::Client,
    anonymous: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, AjaxError> {
        let build = |cookies: bool| {
            reqwest::Client::builder()
                .cookie_store(cookies)
                .build()
                .map_err(|e| AjaxError::Config(format!("failed to build HTTP client: {e}")))
        };
        Ok(Self {
            credentialed: build(true)?,
            anonymous: build(false)?,
        })
    }

    /// Use caller-built clients for credentialed and anonymous requests.
    pub fn with_clients(credentialed: reqwest::Client, anonymous: reqwest::Client) -> Self {
        Self {
            credentialed,
            anonymous,
        }
    }

    fn client_for(&self, request: &HttpRequest) -> &reqwest::Client {
        if request.with_credentials {
            &self.credentialed
        } else {
            &self.anonymous
        }
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client_for(&request)
            .request(reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_bytes());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Legacy retry-on-network-error wrapper.
///
/// Re-sends a request after a transport error, at most `retries` times and
/// only while the online probe reports connectivity. Responses with any
/// status, including 5xx, are returned as-is. Not used by `AjaxClient`
/// unless the caller wraps its transport explicitly.
pub struct RetryTransport<T> {
    inner: T,
    retries: u32,
    online: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl<T: Transport> RetryTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            retries: 1,
            online: Arc::new(|| true),
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_online_check(mut self, online: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.online = Arc::new(online);
        self
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryTransport<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut remaining = self.retries;
        loop {
            match self.inner.send(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if remaining > 0 && (self.online)() => {
                    remaining -= 1;
                    warn!(url = %request.url, error = %e, remaining, "retrying after network error");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
