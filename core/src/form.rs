//! Payload containers: files, file lists, multipart forms and plain params.
//!
//! # Design
//! All containers keep insertion order and allow repeated keys, so the wire
//! order of a form or query string always matches the order the caller
//! appended entries in. Values use owned `String` / `Bytes` so a request can
//! be cloned into a retry or handed to a blocking transport without lifetime
//! concerns.

use bytes::Bytes;

/// Mime type used when a file does not declare one.
pub const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

/// A named binary blob with a declared mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLike {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FileLike {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: DEFAULT_FILE_TYPE.to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// An ordered collection of files, as produced by a multi-file picker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    files: Vec<FileLike>,
}

impl FileList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: FileLike) {
        self.files.push(file);
    }

    pub fn get(&self, index: usize) -> Option<&FileLike> {
        self.files.get(index)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileLike> {
        self.files.iter()
    }
}

impl FromIterator<FileLike> for FileList {
    fn from_iter<I: IntoIterator<Item = FileLike>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FileList {
    type Item = FileLike;
    type IntoIter = std::vec::IntoIter<FileLike>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a FileLike;
    type IntoIter = std::slice::Iter<'a, FileLike>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// A single value held by a `FormData` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(FileLike),
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileLike> {
        match self {
            FormValue::Text(_) => None,
            FormValue::File(f) => Some(f),
        }
    }
}

/// Ordered, multi-valued form container used for multipart bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), FormValue::Text(value.into())));
    }

    pub fn append_file(&mut self, key: impl Into<String>, file: FileLike) {
        self.entries.push((key.into(), FormValue::File(file)));
    }

    pub fn append(&mut self, key: impl Into<String>, value: FormValue) {
        self.entries.push((key.into(), value));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FormValue> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Ordered string key/value pairs: the plain mapping sent as a query string
/// or an urlencoded body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Value-for-value conversion; file entries contribute their file name.
impl From<&FormData> for Params {
    fn from(form: &FormData) -> Self {
        form.iter()
            .map(|(k, v)| {
                let value = match v {
                    FormValue::Text(s) => s.clone(),
                    FormValue::File(f) => f.name.clone(),
                };
                (k.to_string(), value)
            })
            .collect()
    }
}
