use docstore::{Document, DocumentStore};

use crate::doc::{InodeId, SUPERBLOCK_KEY, SUPERBLOCK_RESOURCE, SuperblockBody};
use crate::error::{Error, Result};
use crate::lock::{LockTable, write_lock};

/// Allocate the next inode id for a store.
///
/// Reads and advances the superblock counter under an exclusive lock on
/// the "superblock" resource; the ids handed out are strictly increasing
/// per store. The guard releases on every exit path.
pub(crate) async fn next_inode(store: &dyn DocumentStore, locks: &LockTable) -> Result<InodeId> {
    let _guard = locks.wait(&write_lock(SUPERBLOCK_RESOURCE)).await;

    let raw = store.get(SUPERBLOCK_KEY).await?;
    let superblock: SuperblockBody = serde_json::from_value(raw.body)
        .map_err(|e| Error::bad_document(SUPERBLOCK_KEY, e))?;

    let id = InodeId(superblock.next);
    let next = SuperblockBody {
        next: superblock.next + 1,
    };
    let body = serde_json::to_value(next).map_err(|e| Error::bad_document(SUPERBLOCK_KEY, e))?;
    store
        .put(Document {
            id: SUPERBLOCK_KEY.to_string(),
            rev: raw.rev,
            body,
        })
        .await?;

    Ok(id)
}
