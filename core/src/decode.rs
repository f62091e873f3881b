//! Response body decoding.
//!
//! # Design
//! The decode strategy is picked from the declared Content-Type by
//! substring containment, checked in the order json, text, form-data. This
//! keeps vendor types such as `application/vnd.api+json` decoding as JSON,
//! and means `text/json` is JSON rather than text. The status code is never
//! consulted: a 404 with a JSON body decodes the same as a 200.

use bytes::Bytes;
use futures_util::stream;
use serde_json::Value;

use crate::error::TransportError;
use crate::form::{FileLike, FormData, DEFAULT_FILE_TYPE};
use crate::http::HttpResponse;

/// How a response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Json,
    Text,
    FormData,
    Bytes,
}

impl DecodeStrategy {
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        let Some(ct) = content_type else {
            return DecodeStrategy::Bytes;
        };
        let ct = ct.to_ascii_lowercase();
        if ct.contains("json") {
            DecodeStrategy::Json
        } else if ct.contains("text") {
            DecodeStrategy::Text
        } else if ct.contains("form-data") {
            DecodeStrategy::FormData
        } else {
            DecodeStrategy::Bytes
        }
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Form(FormData),
    Bytes(Bytes),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&FormData> {
        match self {
            ResponseBody::Form(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// Decode `response.body` according to its Content-Type.
///
/// Text bodies are decoded lossily: bytes that are not UTF-8 become U+FFFD
/// and never turn the reply into a network failure.
pub async fn decode(response: &HttpResponse) -> Result<ResponseBody, TransportError> {
    let content_type = response.content_type();
    match DecodeStrategy::for_content_type(content_type) {
        DecodeStrategy::Json => serde_json::from_slice(&response.body)
            .map(ResponseBody::Json)
            .map_err(|e| TransportError::decode(e.to_string())),
        DecodeStrategy::Text => Ok(ResponseBody::Text(
            String::from_utf8_lossy(&response.body).into_owned(),
        )),
        DecodeStrategy::FormData => {
            let content_type = content_type.unwrap_or_default();
            parse_multipart(response.body.clone(), content_type)
                .await
                .map(ResponseBody::Form)
        }
        DecodeStrategy::Bytes => Ok(ResponseBody::Bytes(response.body.clone())),
    }
}

/// Parse a `multipart/form-data` body into a `FormData`.
///
/// Parts with a `filename` become files; all other parts become text.
pub async fn parse_multipart(body: Bytes, content_type: &str) -> Result<FormData, TransportError> {
    let boundary =
        multer::parse_boundary(content_type).map_err(|e| TransportError::decode(e.to_string()))?;
    let stream = stream::once(async move { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = FormData::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| TransportError::decode(e.to_string()))?
    {
        let name = field
            .name()
            .map(str::to_string)
            .ok_or_else(|| TransportError::decode("multipart part without name"))?;
        let file_name = field.file_name().map(str::to_string);
        let part_type = field.content_type().map(|m| m.to_string());
        let content = field
            .bytes()
            .await
            .map_err(|e| TransportError::decode(e.to_string()))?;

        match file_name {
            Some(file_name) => {
                let file = FileLike::new(file_name, content)
                    .with_content_type(part_type.unwrap_or_else(|| DEFAULT_FILE_TYPE.to_string()));
                form.append_file(name, file);
            }
            None => form.append_text(name, String::from_utf8_lossy(&content)),
        }
    }
    Ok(form)
}
