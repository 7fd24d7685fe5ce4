use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::doc::{ENCODING_ARRAYBUFFER, FileBody};
use crate::error::{Error, Result};

/// A file payload as callers see it: text or raw bytes.
///
/// Binary payloads are base64-encoded into the document's `content` field
/// and tagged with `encoding = "arraybuffer"`; text is stored verbatim.
/// `size` always records the original byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    /// Byte length of the original payload.
    pub fn size(&self) -> u64 {
        match self {
            FileContent::Text(s) => s.len() as u64,
            FileContent::Binary(b) => b.len() as u64,
        }
    }

    /// The stored form: (content field, encoding tag).
    pub(crate) fn to_stored(&self) -> (String, Option<String>) {
        match self {
            FileContent::Text(s) => (s.clone(), None),
            FileContent::Binary(b) => (STANDARD.encode(b), Some(ENCODING_ARRAYBUFFER.to_string())),
        }
    }

    /// Decode the payload held by a file document.
    pub(crate) fn from_stored(body: &FileBody) -> Result<FileContent> {
        match body.encoding.as_deref() {
            None => Ok(FileContent::Text(body.content.clone())),
            Some(ENCODING_ARRAYBUFFER) => {
                let bytes = STANDARD
                    .decode(&body.content)
                    .map_err(|e| Error::bad_document("file content", e))?;
                Ok(FileContent::Binary(bytes))
            }
            Some(other) => Err(Error::unsupported_encoding(other)),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContent::Text(s) => Some(s),
            FileContent::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FileContent::Text(_) => None,
            FileContent::Binary(b) => Some(b),
        }
    }
}

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        FileContent::Text(s.to_string())
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        FileContent::Text(s)
    }
}

impl From<&[u8]> for FileContent {
    fn from(b: &[u8]) -> Self {
        FileContent::Binary(b.to_vec())
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(b: Vec<u8>) -> Self {
        FileContent::Binary(b)
    }
}
