//! Document-oriented key/value storage consumed by the docfs core.
//!
//! The store knows nothing about hierarchy: it offers get/put/remove by
//! key over JSON document bodies, a bulk destroy, and a document-count
//! probe. Single-document writes are atomic and revision-checked; every
//! higher-level guarantee (directory trees, inode uniqueness) is built
//! above this interface.

mod error;
mod memory;
mod registry;
mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use registry::StoreRegistry;
pub use store::{Document, DocumentStore, PutReceipt, StoreInfo};
