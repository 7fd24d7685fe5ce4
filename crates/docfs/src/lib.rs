//! A small hierarchical filesystem layered on a document store.
//!
//! Directories and files live as JSON documents keyed by inode id
//! (`i_<n>`); a superblock document (`s_inode`) carries the allocation
//! counter. Directory content maps names to inode ids and always carries
//! the structural "." and ".." entries, with the root linked to itself.
//!
//! Open a [`Filesystem`] through an [`FsRegistry`] so instances over the
//! same store name share documents and the lock table:
//!
//! ```no_run
//! # async fn demo() -> docfs::Result<()> {
//! use docfs::{FsOptions, FsRegistry, MkdirOptions, MkfileOptions, UnformattedPolicy};
//!
//! let registry = FsRegistry::new();
//! let fs = registry
//!     .open(FsOptions {
//!         unformatted: UnformattedPolicy::Format,
//!         ..FsOptions::default()
//!     })
//!     .await?;
//! fs.ready().await?;
//!
//! let mut root = fs.root().await?;
//! let mut docs = root.mkdir("docs", MkdirOptions::default()).await?;
//! docs.mkfile("readme.txt", "hello", MkfileOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod content;
mod dir;
mod doc;
mod entity;
mod error;
mod events;
mod file;
mod fs;
mod inode;
mod lock;
mod path;
mod registry;

#[cfg(test)]
mod tests;

pub use content::FileContent;
pub use dir::{Dir, MkdirOptions, MkfileOptions};
pub use doc::{
    DirBody, DirDoc, ENCODING_ARRAYBUFFER, EntityDoc, FileBody, FileDoc, InodeId, ROOT_INODE,
    SUPERBLOCK_KEY, SuperblockBody,
};
pub use entity::{Entity, EntityType};
pub use error::{Error, Result};
pub use events::{FsEvent, LogLevel};
pub use file::{File, WriteOptions};
pub use fs::{Filesystem, FsOptions, ProbeState, ReadyState, UnformattedPolicy};
pub use lock::{LockMode, LockSet, LockTable};
pub use registry::FsRegistry;
