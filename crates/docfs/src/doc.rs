use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use docstore::Document;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fixed key of the superblock document.
pub const SUPERBLOCK_KEY: &str = "s_inode";

/// Lock-table resource name guarding superblock mutation.
pub const SUPERBLOCK_RESOURCE: &str = "superblock";

/// Reserved inode of the root directory, created once by format.
pub const ROOT_INODE: InodeId = InodeId(1);

/// Encoding tag recorded on binary file documents.
pub const ENCODING_ARRAYBUFFER: &str = "arraybuffer";

/// Unique inode identifier. Stored and displayed as `i_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InodeId(pub u64);

impl InodeId {
    /// The store key for this inode's document.
    pub fn key(&self) -> String {
        format!("i_{}", self.0)
    }

    pub fn parse(s: &str) -> Option<InodeId> {
        s.strip_prefix("i_")?.parse().ok().map(InodeId)
    }

    pub fn is_root(&self) -> bool {
        *self == ROOT_INODE
    }
}

impl std::fmt::Display for InodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i_{}", self.0)
    }
}

impl Serialize for InodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for InodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        InodeId::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid inode id \"{s}\"")))
    }
}

/// Body of the superblock: the next inode number to allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperblockBody {
    pub next: u64,
}

/// Body of a directory document. The content map always carries the
/// structural "." and ".." entries; the root's ".." points to itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirBody {
    pub mod_time: DateTime<Utc>,
    pub content: BTreeMap<String, InodeId>,
}

impl DirBody {
    /// A fresh directory body linking to itself and its parent.
    pub fn new(own: InodeId, parent: InodeId, mod_time: DateTime<Utc>) -> Self {
        let mut content = BTreeMap::new();
        content.insert(".".to_string(), own);
        content.insert("..".to_string(), parent);
        DirBody { mod_time, content }
    }

    /// True once only the structural "." and ".." entries remain.
    pub fn is_empty(&self) -> bool {
        self.content.len() <= 2
    }
}

/// Body of a file document. `content` holds raw text, or base64 when
/// `encoding` is [`ENCODING_ARRAYBUFFER`]; `size` is the byte length of
/// the original payload, not of the stored form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBody {
    pub content: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub mod_time: DateTime<Utc>,
    pub links: u32,
}

/// A typed document snapshot: inode, store revision, and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Typed<B> {
    pub id: InodeId,
    pub rev: u64,
    pub body: B,
}

pub type DirDoc = Typed<DirBody>;
pub type FileDoc = Typed<FileBody>;

fn to_tagged_document<B: Serialize>(
    id: InodeId,
    rev: u64,
    tag: &str,
    body: &B,
) -> Result<Document> {
    let mut value = serde_json::to_value(body).map_err(|e| Error::bad_document(id.key(), e))?;
    match value.as_object_mut() {
        Some(map) => {
            map.insert("type".to_string(), serde_json::Value::String(tag.to_string()));
        }
        None => return Err(Error::bad_document(id.key(), "body is not an object")),
    }
    Ok(Document {
        id: id.key(),
        rev,
        body: value,
    })
}

impl DirDoc {
    pub fn to_document(&self) -> Result<Document> {
        to_tagged_document(self.id, self.rev, "dir", &self.body)
    }
}

impl FileDoc {
    pub fn to_document(&self) -> Result<Document> {
        to_tagged_document(self.id, self.rev, "file", &self.body)
    }
}

/// Closed union over the two materializable document kinds.
///
/// Construction dispatches on the stored `type` tag; anything else is an
/// invalid-entity error, not a recoverable case.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityDoc {
    Dir(DirDoc),
    File(FileDoc),
}

impl EntityDoc {
    pub fn from_document(doc: &Document) -> Result<EntityDoc> {
        let id = InodeId::parse(&doc.id)
            .ok_or_else(|| Error::bad_document(&doc.id, "key is not an inode id"))?;
        let tag = doc
            .body
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        match tag {
            "dir" => {
                let body: DirBody = serde_json::from_value(doc.body.clone())
                    .map_err(|e| Error::bad_document(&doc.id, e))?;
                Ok(EntityDoc::Dir(Typed { id, rev: doc.rev, body }))
            }
            "file" => {
                let body: FileBody = serde_json::from_value(doc.body.clone())
                    .map_err(|e| Error::bad_document(&doc.id, e))?;
                Ok(EntityDoc::File(Typed { id, rev: doc.rev, body }))
            }
            other => Err(Error::invalid_entity_type(other)),
        }
    }

    pub fn id(&self) -> InodeId {
        match self {
            EntityDoc::Dir(d) => d.id,
            EntityDoc::File(f) => f.id,
        }
    }

    pub fn as_dir(&self) -> Result<&DirDoc> {
        match self {
            EntityDoc::Dir(d) => Ok(d),
            EntityDoc::File(_) => Err(Error::NotADirectory),
        }
    }
}
