use chrono::{DateTime, Utc};

use crate::dir::Dir;
use crate::doc::{EntityDoc, InodeId};
use crate::error::{Error, Result};
use crate::file::File;
use crate::fs::Filesystem;

/// The two materializable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Dir,
    File,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Dir => write!(f, "dir"),
            EntityType::File => write!(f, "file"),
        }
    }
}

/// A typed, possibly-stale view over a document snapshot.
///
/// Entities never own the document's identity; the store key is
/// authoritative. Two handles may view the same key without being the
/// same object, so equality compares inode ids.
#[derive(Debug, Clone)]
pub enum Entity {
    Dir(Dir),
    File(File),
}

impl Entity {
    pub(crate) fn materialize(fs: &Filesystem, doc: EntityDoc) -> Entity {
        match doc {
            EntityDoc::Dir(d) => Entity::Dir(Dir::new(fs.clone(), d)),
            EntityDoc::File(f) => Entity::File(File::new(fs.clone(), f)),
        }
    }

    pub fn inode(&self) -> InodeId {
        match self {
            Entity::Dir(d) => d.inode(),
            Entity::File(f) => f.inode(),
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Dir(_) => EntityType::Dir,
            Entity::File(_) => EntityType::File,
        }
    }

    pub fn mod_time(&self) -> DateTime<Utc> {
        match self {
            Entity::Dir(d) => d.mod_time(),
            Entity::File(f) => f.mod_time(),
        }
    }

    /// Re-fetch the backing document and replace the held snapshot.
    pub async fn refresh(&mut self) -> Result<()> {
        let fs = match self {
            Entity::Dir(d) => d.fs().clone(),
            Entity::File(f) => f.fs().clone(),
        };
        let raw = fs.store().get(&self.inode().key()).await?;
        let doc = EntityDoc::from_document(&raw)?;
        *self = Entity::materialize(&fs, doc);
        Ok(())
    }

    pub fn into_dir(self) -> Result<Dir> {
        match self {
            Entity::Dir(d) => Ok(d),
            Entity::File(_) => Err(Error::NotADirectory),
        }
    }

    pub fn into_file(self) -> Result<File> {
        match self {
            Entity::File(f) => Ok(f),
            Entity::Dir(_) => Err(Error::NotAFile),
        }
    }

    pub fn as_dir(&self) -> Option<&Dir> {
        match self {
            Entity::Dir(d) => Some(d),
            Entity::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Entity::File(f) => Some(f),
            Entity::Dir(_) => None,
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.inode() == other.inode()
    }
}
