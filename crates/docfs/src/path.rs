use docstore::DocumentStore;

use crate::doc::{EntityDoc, ROOT_INODE};
use crate::error::{Error, Result};

/// Resolve one name against a directory document.
///
/// The structural "." and ".." entries resolve like any other name since
/// every directory's content map carries them.
pub(crate) async fn resolve_name(
    store: &dyn DocumentStore,
    doc: &EntityDoc,
    name: &str,
) -> Result<EntityDoc> {
    let dir = doc.as_dir()?;
    let inode = dir
        .body
        .content
        .get(name)
        .ok_or_else(|| Error::not_found(name))?;
    let raw = store.get(&inode.key()).await?;
    EntityDoc::from_document(&raw)
}

/// Walk a slash-delimited path from a starting document.
///
/// Empty paths return the start unchanged; repeated, leading, and trailing
/// slashes are collapsed.
pub(crate) async fn resolve_from(
    store: &dyn DocumentStore,
    start: EntityDoc,
    path: &str,
) -> Result<EntityDoc> {
    let mut doc = start;
    for name in path.split('/').filter(|s| !s.is_empty()) {
        doc = resolve_name(store, &doc, name).await?;
    }
    Ok(doc)
}

/// Absolute lookup from the filesystem root. The path must begin with "/".
pub(crate) async fn resolve_root(store: &dyn DocumentStore, path: &str) -> Result<EntityDoc> {
    if !path.starts_with('/') {
        return Err(Error::path_format(path));
    }
    let raw = store.get(&ROOT_INODE.key()).await?;
    let root = EntityDoc::from_document(&raw)?;
    resolve_from(store, root, path).await
}
