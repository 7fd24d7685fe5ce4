use std::sync::Arc;

use chrono::Utc;
use diagnostics::{log_error, log_info};
use docstore::{Document, DocumentStore};
use tokio::sync::{broadcast, watch};

use crate::doc::{
    DirBody, DirDoc, ROOT_INODE, SUPERBLOCK_KEY, SUPERBLOCK_RESOURCE, SuperblockBody,
};
use crate::dir::Dir;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::events::{FsEvent, LogLevel};
use crate::inode;
use crate::lock::{LockTable, write_lock};
use crate::path;

/// Classification of a store's content at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Superblock and root directory both present.
    Ok,
    /// The store holds no documents at all.
    Unformatted,
    /// The store holds documents but not a usable filesystem.
    Corrupt,
}

impl std::fmt::Display for ProbeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeState::Ok => write!(f, "ok"),
            ProbeState::Unformatted => write!(f, "unformatted"),
            ProbeState::Corrupt => write!(f, "corrupt"),
        }
    }
}

/// What to do when the open probe finds an empty store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnformattedPolicy {
    /// Report the state and stay pending.
    #[default]
    Fail,
    /// Format in place and come up ready.
    Format,
}

/// Open-time options.
#[derive(Debug, Clone)]
pub struct FsOptions {
    /// Store name suffix; `None` selects the shared default store.
    pub db_name: Option<String>,
    /// Mirror the event log onto the diagnostic sink.
    pub debug: bool,
    /// Re-fetch entity snapshots before every read. On by default;
    /// disable to work against held snapshots and refresh by hand.
    pub auto_refresh: bool,
    pub unformatted: UnformattedPolicy,
}

impl Default for FsOptions {
    fn default() -> Self {
        FsOptions {
            db_name: None,
            debug: false,
            auto_refresh: true,
            unformatted: UnformattedPolicy::default(),
        }
    }
}

impl FsOptions {
    /// The backing store name: `docfs` or `docfs_<db_name>`. Instances
    /// opened with the same name share documents and locks.
    pub fn store_name(&self) -> String {
        match &self.db_name {
            Some(name) => format!("docfs_{name}"),
            None => "docfs".to_string(),
        }
    }
}

/// Readiness of a filesystem instance, published on a watch channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadyState {
    Pending,
    Ready,
    Failed(Error),
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    locks: LockTable,
    options: FsOptions,
    ready: watch::Sender<ReadyState>,
    events: broadcast::Sender<FsEvent>,
}

/// A filesystem over a document store. Cheap to clone; clones share the
/// store, the lock table, and the event channel.
#[derive(Clone)]
pub struct Filesystem {
    inner: Arc<Inner>,
}

impl Filesystem {
    /// Open a filesystem over `store`, probing it before returning.
    ///
    /// The instance is returned even when the probe leaves it unusable;
    /// [`Filesystem::ready`] reports the outcome. `locks` must be the
    /// table shared by every instance over the same store.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        locks: LockTable,
        options: FsOptions,
    ) -> Result<Filesystem> {
        let (fs, _events) = Filesystem::open_with_observer(store, locks, options).await?;
        Ok(fs)
    }

    /// Like [`Filesystem::open`], but the returned receiver is subscribed
    /// before the probe runs so no startup event is missed.
    pub async fn open_with_observer(
        store: Arc<dyn DocumentStore>,
        locks: LockTable,
        options: FsOptions,
    ) -> Result<(Filesystem, broadcast::Receiver<FsEvent>)> {
        if options.debug {
            diagnostics::init_diagnostics();
        }
        let (ready, _) = watch::channel(ReadyState::Pending);
        let (events, receiver) = broadcast::channel(256);
        let fs = Filesystem {
            inner: Arc::new(Inner {
                store,
                locks,
                options,
                ready,
                events,
            }),
        };
        fs.probe().await?;
        Ok((fs, receiver))
    }

    /// Probe the store and drive the instance to its initial state.
    async fn probe(&self) -> Result<()> {
        match self.classify().await {
            Ok(ProbeState::Ok) => {
                self.inner.ready.send_replace(ReadyState::Ready);
                self.emit(FsEvent::Ready);
                self.log(LogLevel::Info, "filesystem online".to_string());
                Ok(())
            }
            Ok(ProbeState::Unformatted)
                if self.inner.options.unformatted == UnformattedPolicy::Format =>
            {
                self.format().await
            }
            Ok(state) => {
                self.emit(FsEvent::InitFailed(state));
                if state == ProbeState::Unformatted {
                    // Pending, not failed: a later format() resolves it.
                    self.log(LogLevel::Error, Error::Unformatted.to_string());
                } else {
                    self.log(LogLevel::Error, Error::Corrupt.to_string());
                    self.inner
                        .ready
                        .send_replace(ReadyState::Failed(Error::Corrupt));
                }
                Ok(())
            }
            Err(err) => {
                self.emit(FsEvent::InitError(err.to_string()));
                self.log(
                    LogLevel::Error,
                    format!("unrecognised filesystem error: {err}"),
                );
                self.inner.ready.send_replace(ReadyState::Failed(err));
                Ok(())
            }
        }
    }

    /// Classify the store. A missing document distinguishes an empty
    /// store from a corrupt one by total document count; any other fetch
    /// failure classifies as corrupt. Only a failing count probe escapes
    /// as an error.
    async fn classify(&self) -> Result<ProbeState> {
        for key in [ROOT_INODE.key(), SUPERBLOCK_KEY.to_string()] {
            match self.store().get(&key).await {
                Ok(_) => {}
                Err(err) if err.is_not_found() => {
                    let info = self.store().info().await?;
                    return Ok(if info.doc_count == 0 {
                        ProbeState::Unformatted
                    } else {
                        ProbeState::Corrupt
                    });
                }
                Err(_) => return Ok(ProbeState::Corrupt),
            }
        }
        Ok(ProbeState::Ok)
    }

    /// Wait until the instance is usable.
    ///
    /// Resolves once the probe (or a later format) reaches `Ready`, or
    /// returns the failure it reached instead. An unformatted store under
    /// the default policy never resolves until someone calls
    /// [`Filesystem::format`].
    pub async fn ready(&self) -> Result<()> {
        let mut receiver = self.inner.ready.subscribe();
        loop {
            match receiver.borrow_and_update().clone() {
                ReadyState::Ready => return Ok(()),
                ReadyState::Failed(err) => return Err(err),
                ReadyState::Pending => {}
            }
            receiver
                .changed()
                .await
                .map_err(|_| Error::Corrupt)?;
        }
    }

    /// Wipe the store and lay down a fresh filesystem: superblock with
    /// the counter at 2, root directory at inode 1 linked to itself.
    pub async fn format(&self) -> Result<()> {
        self.emit(FsEvent::Format);
        self.log(LogLevel::Info, "filesystem format initiated".to_string());

        self.store().destroy().await?;

        {
            let _guard = self.locks().wait(&write_lock(SUPERBLOCK_RESOURCE)).await;
            let superblock = serde_json::to_value(SuperblockBody { next: 2 })
                .map_err(|e| Error::bad_document(SUPERBLOCK_KEY, e))?;
            self.store()
                .put(Document::new(SUPERBLOCK_KEY, superblock))
                .await?;
            let root = DirDoc {
                id: ROOT_INODE,
                rev: 0,
                body: DirBody::new(ROOT_INODE, ROOT_INODE, Utc::now()),
            };
            self.store().put(root.to_document()?).await?;
        }

        self.inner.ready.send_replace(ReadyState::Ready);
        self.log(LogLevel::Info, "filesystem online".to_string());
        self.emit(FsEvent::Ready);
        Ok(())
    }

    /// Drop every document and return the instance to pending. A later
    /// [`Filesystem::format`] brings it back up.
    pub async fn destroy(&self) -> Result<()> {
        self.store().destroy().await?;
        self.inner.ready.send_replace(ReadyState::Pending);
        Ok(())
    }

    /// Absolute lookup. The path must begin with "/".
    pub async fn get(&self, path: &str) -> Result<Entity> {
        let doc = path::resolve_root(self.store(), path).await?;
        Ok(Entity::materialize(self, doc))
    }

    /// The root directory.
    pub async fn root(&self) -> Result<Dir> {
        self.get("/").await?.into_dir()
    }

    /// Subscribe to this instance's event stream. Only events emitted
    /// after the call are seen; use [`Filesystem::open_with_observer`]
    /// to observe startup.
    pub fn subscribe(&self) -> broadcast::Receiver<FsEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) fn store(&self) -> &dyn DocumentStore {
        &*self.inner.store
    }

    pub(crate) fn locks(&self) -> &LockTable {
        &self.inner.locks
    }

    pub(crate) fn auto_refresh(&self) -> bool {
        self.inner.options.auto_refresh
    }

    pub(crate) async fn next_inode(&self) -> Result<crate::doc::InodeId> {
        inode::next_inode(self.store(), self.locks()).await
    }

    /// Publish an event; delivery is best-effort and lag drops the
    /// oldest entries for slow subscribers.
    pub(crate) fn emit(&self, event: FsEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Record a log line on the event stream, mirrored to the diagnostic
    /// sink when the debug option is set.
    pub(crate) fn log(&self, level: LogLevel, message: String) {
        if self.inner.options.debug {
            let store = self.inner.options.store_name();
            match level {
                LogLevel::Info => {
                    log_info!("{store}: {message}", store: store, message: message.clone());
                }
                LogLevel::Error => {
                    log_error!("{store}: {message}", store: store, message: message.clone());
                }
            }
        }
        self.emit(FsEvent::Log { level, message });
    }
}

impl std::fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filesystem")
            .field("store", &self.inner.options.store_name())
            .finish()
    }
}

impl PartialEq for Filesystem {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
