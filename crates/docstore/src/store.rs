use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A stored document: key, store-assigned revision, and JSON body.
///
/// A revision of zero marks a document that has never been written; `put`
/// treats it as a create and fails with `Conflict` if the key exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub rev: u64,
    pub body: Value,
}

impl Document {
    pub fn new<S: Into<String>>(id: S, body: Value) -> Self {
        Document {
            id: id.into(),
            rev: 0,
            body,
        }
    }
}

/// Returned by a successful `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    pub id: String,
    pub rev: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreInfo {
    pub doc_count: usize,
}

/// Contract the filesystem core consumes.
///
/// Implementations must make individual `put` calls atomic with respect to
/// each other; nothing here spans more than one document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by key. Fails with `NotFound` when absent.
    async fn get(&self, id: &str) -> Result<Document>;

    /// Write a document. The supplied revision must match the stored one
    /// (or be zero for a create); mismatches fail with `Conflict`.
    async fn put(&self, doc: Document) -> Result<PutReceipt>;

    /// Delete a document at the revision held by the caller.
    async fn remove(&self, doc: &Document) -> Result<()>;

    /// Drop every document in the store.
    async fn destroy(&self) -> Result<()>;

    /// Count probe used by the lifecycle controller to classify stores.
    async fn info(&self) -> Result<StoreInfo>;
}
