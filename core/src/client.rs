//! Request client: verb entry points over a single execution routine.
//!
//! # Design
//! Every verb is split into a `build_*` method that produces an
//! `HttpRequest` and the shared `execute` step that sends it through the
//! `Transport` and decodes the answer. The builders take a snapshot of the
//! default headers at call time, so a header mutation only affects calls
//! built after it.
//!
//! `execute` never fails: transport and decode failures come back as a
//! `Reply` with status `-1`. Only caller mistakes in `upload_*` are `Err`.

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientConfig, CredentialsPolicy};
use crate::decode::{self, ResponseBody};
use crate::encode::{self, UploadPayload};
use crate::error::{AjaxError, TransportError};
use crate::form::Params;
use crate::headers::{self, HeaderStore};
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::{ReqwestTransport, Transport};

/// Status of a reply whose exchange never produced an HTTP status.
pub const NETWORK_FAILURE: i32 = -1;

const UPLOAD_METHODS: [HttpMethod; 2] = [HttpMethod::Post, HttpMethod::Put];

/// Outcome of a call: HTTP status and decoded body.
///
/// On a network failure `status` is `NETWORK_FAILURE` and `body` is
/// `Text("<kind>:<message>")`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: i32,
    pub body: ResponseBody,
}

impl Reply {
    fn network_failure(error: &TransportError) -> Self {
        Self {
            status: NETWORK_FAILURE,
            body: ResponseBody::Text(error.to_string()),
        }
    }

    pub fn is_network_failure(&self) -> bool {
        self.status == NETWORK_FAILURE
    }

    pub fn into_parts(self) -> (i32, ResponseBody) {
        (self.status, self.body)
    }
}

/// Client holding default headers, a credentials policy and a transport.
pub struct AjaxClient<T = ReqwestTransport> {
    transport: T,
    headers: RwLock<HeaderStore>,
    credentials: CredentialsPolicy,
    origin: Option<Url>,
}

impl AjaxClient<ReqwestTransport> {
    /// Client with default configuration over a fresh `reqwest` client.
    pub fn new() -> Result<Self, AjaxError> {
        Ok(Self::with_transport(ReqwestTransport::new()?, ClientConfig::default()))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, AjaxError> {
        Ok(Self::with_transport(ReqwestTransport::new()?, config))
    }
}

impl<T: Transport> AjaxClient<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        let mut store = HeaderStore::new();
        for (name, value) in &config.headers {
            store.set(name, value);
        }
        Self {
            transport,
            headers: RwLock::new(store),
            credentials: config.credentials,
            origin: config.origin,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Default headers
    // -----------------------------------------------------------------------

    /// Send `name: value` with every later call. `X-Requested-With` is fixed.
    pub fn set_header(&self, name: &str, value: &str) {
        self.headers.write().set(name, value);
    }

    /// Stop sending `name` with later calls. `X-Requested-With` and `Accept`
    /// stay.
    pub fn remove_header(&self, name: &str) {
        self.headers.write().remove(name);
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.read().get(name).map(str::to_string)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    /// GET with `data` appended as `&k=v...` (no `?` is added).
    pub fn build_get(
        &self,
        url: &str,
        data: Option<&Params>,
        headers: Option<&[(&str, &str)]>,
    ) -> HttpRequest {
        let url = match data {
            Some(params) => encode::append_query(url, params),
            None => url.to_string(),
        };
        let headers = self.request_headers(headers);
        let with_credentials = self.allows_credentials(&url);
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers,
            body: None,
            with_credentials,
        }
    }

    pub fn build_post(
        &self,
        url: &str,
        data: Option<&Params>,
        headers: Option<&[(&str, &str)]>,
    ) -> HttpRequest {
        self.build_with_params(HttpMethod::Post, url, data, headers)
    }

    pub fn build_put(
        &self,
        url: &str,
        data: Option<&Params>,
        headers: Option<&[(&str, &str)]>,
    ) -> HttpRequest {
        self.build_with_params(HttpMethod::Put, url, data, headers)
    }

    pub fn build_delete(
        &self,
        url: &str,
        data: Option<&Params>,
        headers: Option<&[(&str, &str)]>,
    ) -> HttpRequest {
        self.build_with_params(HttpMethod::Delete, url, data, headers)
    }

    /// Multipart upload request. Only POST and PUT (any case) are accepted.
    pub fn build_upload(
        &self,
        url: &str,
        method: &str,
        payload: UploadPayload,
        headers: Option<&[(&str, &str)]>,
    ) -> Result<HttpRequest, AjaxError> {
        let method = upload_method(method)?;
        let mut headers = self.request_headers(headers);
        let body = encode::process_files(payload, &mut headers);
        Ok(HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body: Some(body),
            with_credentials: self.allows_credentials(url),
        })
    }

    fn build_with_params(
        &self,
        method: HttpMethod,
        url: &str,
        data: Option<&Params>,
        headers: Option<&[(&str, &str)]>,
    ) -> HttpRequest {
        let mut headers = self.request_headers(headers);
        let body = data.map(|params| encode::process_params(params, &mut headers));
        HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body,
            with_credentials: self.allows_credentials(url),
        }
    }

    /// Snapshot of the defaults with per-call overrides applied.
    fn request_headers(&self, overrides: Option<&[(&str, &str)]>) -> Vec<(String, String)> {
        let mut snapshot = self.headers.read().snapshot();
        if let Some(overrides) = overrides {
            headers::merge(&mut snapshot, overrides);
        }
        snapshot
    }

    fn allows_credentials(&self, url: &str) -> bool {
        self.credentials.allows(self.origin.as_ref(), url)
    }

    // -----------------------------------------------------------------------
    // Verbs
    // -----------------------------------------------------------------------

    pub async fn get(&self, url: &str, data: Option<&Params>, headers: Option<&[(&str, &str)]>) -> Reply {
        self.execute(self.build_get(url, data, headers)).await
    }

    pub async fn post(&self, url: &str, data: Option<&Params>, headers: Option<&[(&str, &str)]>) -> Reply {
        self.execute(self.build_post(url, data, headers)).await
    }

    pub async fn put(&self, url: &str, data: Option<&Params>, headers: Option<&[(&str, &str)]>) -> Reply {
        self.execute(self.build_put(url, data, headers)).await
    }

    pub async fn delete(&self, url: &str, data: Option<&Params>, headers: Option<&[(&str, &str)]>) -> Reply {
        self.execute(self.build_delete(url, data, headers)).await
    }

    /// Upload a form, a file (field `"0"`) or a file list (fields `"0"`,
    /// `"1"`, ...). A disallowed method fails before anything is sent.
    pub async fn upload_file(
        &self,
        url: &str,
        method: &str,
        payload: impl Into<UploadPayload>,
        headers: Option<&[(&str, &str)]>,
    ) -> Result<Reply, AjaxError> {
        let request = self.build_upload(url, method, payload.into(), headers)?;
        Ok(self.execute(request).await)
    }

    /// `upload_file` for payloads described as JSON; see
    /// `UploadPayload::try_from` for the accepted shapes.
    pub async fn upload_value(
        &self,
        url: &str,
        method: &str,
        payload: &Value,
        headers: Option<&[(&str, &str)]>,
    ) -> Result<Reply, AjaxError> {
        upload_method(method)?;
        let payload = UploadPayload::try_from(payload)?;
        self.upload_file(url, method, payload, headers).await
    }

    /// Send a built request and decode the response.
    pub async fn execute(&self, request: HttpRequest) -> Reply {
        let method = request.method;
        let url = request.url.clone();
        debug!(%method, %url, "dispatching request");

        let outcome = match self.transport.send(request).await {
            Ok(response) => decode::decode(&response).await.map(|body| Reply {
                status: i32::from(response.status),
                body,
            }),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(reply) => {
                debug!(%method, %url, status = reply.status, "request resolved");
                reply
            }
            Err(e) => {
                warn!(%method, %url, error = %e, "request failed");
                Reply::network_failure(&e)
            }
        }
    }
}

fn upload_method(method: &str) -> Result<HttpMethod, AjaxError> {
    HttpMethod::parse(method)
        .filter(|m| UPLOAD_METHODS.contains(m))
        .ok_or_else(|| {
            let allowed: Vec<_> = UPLOAD_METHODS.iter().map(|m| m.as_str()).collect();
            AjaxError::InvalidArgument(format!(
                "Method must be one of {}. Got {method}",
                allowed.join(", ")
            ))
        })
}
