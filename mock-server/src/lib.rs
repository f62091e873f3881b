use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Multipart, Path},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Boundary of the canned multipart response served at `/multipart`.
pub const MULTIPART_BOUNDARY: &str = "mock-server-boundary";

/// What `/echo` saw of a request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// One part received by `/upload`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedPart {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub text: Option<String>,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/form", post(form_fields).put(form_fields).delete(form_fields))
        .route("/upload", post(upload).put(upload))
        .route("/text", get(text))
        .route("/multipart", get(multipart))
        .route("/bytes", get(bytes))
        .route("/malformed", get(malformed))
        .route("/status/{code}", any(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();
    tracing::debug!(%method, %uri, "echo");
    Json(Echo {
        method: method.to_string(),
        uri: uri.to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn form_fields(Form(fields): Form<Vec<(String, String)>>) -> Json<Vec<(String, String)>> {
    Json(fields)
}

async fn upload(mut multipart: Multipart) -> Result<Json<Vec<UploadedPart>>, (StatusCode, String)> {
    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        parts.push(UploadedPart {
            field: name,
            file_name,
            content_type,
            size: data.len(),
            text: String::from_utf8(data.to_vec()).ok(),
        });
    }
    tracing::info!(parts = parts.len(), "upload received");
    Ok(Json(parts))
}

async fn text() -> &'static str {
    "foo"
}

async fn multipart() -> impl IntoResponse {
    let b = MULTIPART_BOUNDARY;
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"status\"\r\n\r\n\
         ok\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"report\"; filename=\"report.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         all good\r\n\
         --{b}--\r\n"
    );
    (
        [(header::CONTENT_TYPE, format!("multipart/form-data; boundary={b}"))],
        body,
    )
}

async fn bytes() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        vec![0u8, 1, 2, 3],
    )
}

async fn malformed() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "{not json")
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(serde_json::json!({ "status": status.as_u16() })))
}
