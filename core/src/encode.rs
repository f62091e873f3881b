//! Request payload encoding.
//!
//! Plain params become `application/x-www-form-urlencoded` text; files,
//! file lists and forms become a `multipart/form-data` body.

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::AjaxError;
use crate::form::{FileLike, FileList, FormData, FormValue, Params, DEFAULT_FILE_TYPE};
use crate::http::RequestBody;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Serialize params as `k1=v1&k2=v2`, in insertion order.
pub fn form_encode(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in params.iter() {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}

pub fn form_decode(input: &str) -> Params {
    form_urlencoded::parse(input.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Append params to a GET URL as `&` + encoded params.
///
/// No `?` is inserted: the caller's URL is expected to carry one already.
pub fn append_query(url: &str, params: &Params) -> String {
    format!("{url}&{}", form_encode(params))
}

/// Encode params as the request body and force the urlencoded content type
/// on the per-call headers.
pub fn process_params(params: &Params, headers: &mut Vec<(String, String)>) -> RequestBody {
    set_content_type(headers, FORM_URLENCODED.to_string());
    RequestBody::UrlEncoded(form_encode(params))
}

/// A file upload payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPayload {
    /// Sent verbatim; the caller owns its field names.
    Form(FormData),
    /// Sent under field `"0"`.
    File(FileLike),
    /// Sent under fields `"0"`, `"1"`, ... in list order.
    Files(FileList),
}

impl UploadPayload {
    pub fn into_form_data(self) -> FormData {
        match self {
            UploadPayload::Form(form) => form,
            UploadPayload::File(file) => {
                let mut form = FormData::new();
                form.append_file("0", file);
                form
            }
            UploadPayload::Files(files) => {
                let mut form = FormData::new();
                for (idx, file) in files.into_iter().enumerate() {
                    form.append_file(idx.to_string(), file);
                }
                form
            }
        }
    }
}

impl From<FormData> for UploadPayload {
    fn from(form: FormData) -> Self {
        UploadPayload::Form(form)
    }
}

impl From<FileLike> for UploadPayload {
    fn from(file: FileLike) -> Self {
        UploadPayload::File(file)
    }
}

impl From<FileList> for UploadPayload {
    fn from(files: FileList) -> Self {
        UploadPayload::Files(files)
    }
}

/// Upload payloads arriving through a dynamic interface.
///
/// Accepted shapes:
/// - file: `{"name": "a.txt", "content": "...", "type": "text/plain"}` (`type` optional)
/// - file list: `{"files": [file, ...]}`
/// - form: `{"entries": [["key", "text" | file], ...]}`
impl TryFrom<&Value> for UploadPayload {
    type Error = AjaxError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        if let Some(file) = file_from_value(value) {
            return Ok(UploadPayload::File(file));
        }
        if let Some(Value::Array(items)) = value.get("files") {
            let files: Option<FileList> = items.iter().map(file_from_value).collect();
            if let Some(files) = files {
                return Ok(UploadPayload::Files(files));
            }
        }
        if let Some(Value::Array(items)) = value.get("entries") {
            if let Some(form) = form_from_entries(items) {
                return Ok(UploadPayload::Form(form));
            }
        }
        Err(AjaxError::InvalidArgument(format!(
            "File or FileList object expected. Got {}",
            type_name(value)
        )))
    }
}

fn file_from_value(value: &Value) -> Option<FileLike> {
    let name = value.get("name")?.as_str()?;
    let content = value.get("content")?.as_str()?;
    let content_type = match value.get("type") {
        None => DEFAULT_FILE_TYPE,
        Some(t) => t.as_str()?,
    };
    Some(FileLike::new(name, content.to_string()).with_content_type(content_type))
}

fn form_from_entries(items: &[Value]) -> Option<FormData> {
    let mut form = FormData::new();
    for item in items {
        let [key, value] = item.as_array()?.as_slice() else {
            return None;
        };
        let key = key.as_str()?;
        match value {
            Value::String(s) => form.append_text(key, s.as_str()),
            other => form.append_file(key, file_from_value(other)?),
        }
    }
    Some(form)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// Turn an upload payload into a multipart body and announce its boundary
/// on the per-call headers.
pub fn process_files(payload: UploadPayload, headers: &mut Vec<(String, String)>) -> RequestBody {
    let boundary = new_boundary();
    set_content_type(headers, format!("{MULTIPART_FORM_DATA}; boundary={boundary}"));
    RequestBody::Multipart {
        form: payload.into_form_data(),
        boundary,
    }
}

pub fn new_boundary() -> String {
    format!("----AjaxFormBoundary{}", Uuid::new_v4().simple())
}

/// RFC 7578 body for `form` delimited by `boundary`.
pub fn encode_multipart(form: &FormData, boundary: &str) -> Bytes {
    let mut buf = BytesMut::new();
    for (key, value) in form.iter() {
        buf.put_slice(format!("--{boundary}\r\n").as_bytes());
        match value {
            FormValue::Text(text) => {
                buf.put_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        escape_field(key)
                    )
                    .as_bytes(),
                );
                buf.put_slice(text.as_bytes());
            }
            FormValue::File(file) => {
                buf.put_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        escape_field(key),
                        escape_field(&file.name),
                        file.content_type
                    )
                    .as_bytes(),
                );
                buf.put_slice(&file.bytes);
            }
        }
        buf.put_slice(b"\r\n");
    }
    buf.put_slice(format!("--{boundary}--\r\n").as_bytes());
    buf.freeze()
}

// Field names and file names are quoted strings; escape the characters that
// would end the quote or the header line.
fn escape_field(s: &str) -> String {
    s.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}

fn set_content_type(headers: &mut Vec<(String, String)>, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case("content-type"));
    headers.push(("Content-Type".to_string(), value));
}
