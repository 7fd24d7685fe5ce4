use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Result, StoreError};
use crate::store::{Document, DocumentStore, PutReceipt, StoreInfo};

/// In-memory reference store with optimistic revision checking.
///
/// Used by the test suite and anywhere a process-local filesystem is
/// enough. Revisions count up from 1 on every accepted write.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, (u64, serde_json::Value)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Document> {
        let docs = self.docs.lock().await;
        match docs.get(id) {
            Some((rev, body)) => Ok(Document {
                id: id.to_string(),
                rev: *rev,
                body: body.clone(),
            }),
            None => Err(StoreError::not_found(id)),
        }
    }

    async fn put(&self, doc: Document) -> Result<PutReceipt> {
        let mut docs = self.docs.lock().await;
        let current = docs.get(&doc.id).map(|(rev, _)| *rev).unwrap_or(0);
        if doc.rev != current {
            return Err(StoreError::conflict(&doc.id));
        }
        let rev = current + 1;
        docs.insert(doc.id.clone(), (rev, doc.body));
        Ok(PutReceipt { id: doc.id, rev })
    }

    async fn remove(&self, doc: &Document) -> Result<()> {
        let mut docs = self.docs.lock().await;
        match docs.get(&doc.id) {
            None => Err(StoreError::not_found(&doc.id)),
            Some((rev, _)) if *rev != doc.rev => Err(StoreError::conflict(&doc.id)),
            Some(_) => {
                docs.remove(&doc.id);
                Ok(())
            }
        }
    }

    async fn destroy(&self) -> Result<()> {
        self.docs.lock().await.clear();
        Ok(())
    }

    async fn info(&self) -> Result<StoreInfo> {
        let docs = self.docs.lock().await;
        Ok(StoreInfo {
            doc_count: docs.len(),
        })
    }
}
