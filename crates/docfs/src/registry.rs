use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use docstore::{DocumentStore, StoreRegistry};
use tokio::sync::broadcast;

use crate::error::Result;
use crate::events::FsEvent;
use crate::fs::{Filesystem, FsOptions};
use crate::lock::LockTable;

/// Opens filesystem instances over in-process stores.
///
/// Instances opened through the same registry with the same store name
/// share one store and one lock table, so their operations serialize
/// against each other the same way one instance's do.
#[derive(Default)]
pub struct FsRegistry {
    stores: StoreRegistry,
    locks: Mutex<HashMap<String, LockTable>>,
}

impl FsRegistry {
    pub fn new() -> FsRegistry {
        FsRegistry::default()
    }

    /// Open an instance; see [`Filesystem::open`] for probe behavior.
    pub async fn open(&self, options: FsOptions) -> Result<Filesystem> {
        let name = options.store_name();
        let store: Arc<dyn DocumentStore> = self.stores.open(&name).await;
        Filesystem::open(store, self.lock_table(&name), options).await
    }

    /// Open an instance with an event receiver subscribed before the
    /// startup probe runs.
    pub async fn open_with_observer(
        &self,
        options: FsOptions,
    ) -> Result<(Filesystem, broadcast::Receiver<FsEvent>)> {
        let name = options.store_name();
        let store: Arc<dyn DocumentStore> = self.stores.open(&name).await;
        Filesystem::open_with_observer(store, self.lock_table(&name), options).await
    }

    fn lock_table(&self, name: &str) -> LockTable {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}
