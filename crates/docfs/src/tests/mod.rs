mod lifecycle;
mod paths;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};

use async_trait::async_trait;
use docstore::{Document, DocumentStore, MemoryStore, PutReceipt, StoreError, StoreInfo};

use crate::{Filesystem, FsOptions, FsRegistry, UnformattedPolicy};

pub(crate) fn format_options() -> FsOptions {
    FsOptions {
        unformatted: UnformattedPolicy::Format,
        ..FsOptions::default()
    }
}

/// A fresh, formatted, ready filesystem over its own private store.
pub(crate) async fn new_fs() -> Filesystem {
    let registry = FsRegistry::new();
    let fs = registry.open(format_options()).await.unwrap();
    fs.ready().await.unwrap();
    fs
}

/// Store wrapper that injects failures: every get fails while `fail_gets`
/// is set, every info likewise, and one put fails after
/// `puts_before_failure` successes.
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    puts_before_failure: AtomicIsize,
    fail_gets: AtomicBool,
    fail_info: AtomicBool,
}

impl FlakyStore {
    pub(crate) fn new() -> Arc<FlakyStore> {
        Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            puts_before_failure: AtomicIsize::new(-1),
            fail_gets: AtomicBool::new(false),
            fail_info: AtomicBool::new(false),
        })
    }

    pub(crate) fn fail_put_after(&self, successes: isize) {
        self.puts_before_failure.store(successes, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_info(&self, fail: bool) {
        self.fail_info.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, id: &str) -> Result<Document, StoreError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::backend("injected get failure"));
        }
        self.inner.get(id).await
    }

    async fn put(&self, doc: Document) -> Result<PutReceipt, StoreError> {
        let remaining = self.puts_before_failure.load(Ordering::SeqCst);
        if remaining == 0 {
            self.puts_before_failure.store(-1, Ordering::SeqCst);
            return Err(StoreError::backend("injected put failure"));
        }
        if remaining > 0 {
            self.puts_before_failure
                .store(remaining - 1, Ordering::SeqCst);
        }
        self.inner.put(doc).await
    }

    async fn remove(&self, doc: &Document) -> Result<(), StoreError> {
        self.inner.remove(doc).await
    }

    async fn destroy(&self) -> Result<(), StoreError> {
        self.inner.destroy().await
    }

    async fn info(&self) -> Result<StoreInfo, StoreError> {
        if self.fail_info.load(Ordering::SeqCst) {
            return Err(StoreError::backend("injected info failure"));
        }
        self.inner.info().await
    }
}
