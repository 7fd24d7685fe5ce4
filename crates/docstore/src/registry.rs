use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::memory::MemoryStore;

/// Maps store names to shared [`MemoryStore`] handles.
///
/// Two callers opening the same name observe the same documents, which is
/// what lets separately constructed filesystem instances share state. The
/// registry hands out clones of one `Arc` per name; dropping every handle
/// does not discard the documents until the registry itself goes away.
#[derive(Default)]
pub struct StoreRegistry {
    stores: Mutex<HashMap<String, Arc<MemoryStore>>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) the store with the given name.
    pub async fn open(&self, name: &str) -> Arc<MemoryStore> {
        let mut stores = self.stores.lock().await;
        stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new()))
            .clone()
    }
}
