use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use regex::Regex;

use crate::content::FileContent;
use crate::doc::{DirBody, DirDoc, EntityDoc, FileBody, InodeId, Typed};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::events::FsEvent;
use crate::file::File;
use crate::fs::Filesystem;
use crate::lock::write_lock;
use crate::path;

/// Name with a 3-4 character extension, for free-name probing.
static NAME_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+.*)\.(\S{3,4})$").expect("static regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct MkdirOptions {
    /// Resolve a collision-free variant of the requested name first.
    pub free_name: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MkfileOptions {
    pub free_name: bool,
    pub mime_type: Option<String>,
    /// Modification stamp override; defaults to now.
    pub mod_time: Option<DateTime<Utc>>,
}

/// Directory entity: a snapshot of a directory document plus its owning
/// filesystem. All tree mutation goes through here.
#[derive(Debug, Clone)]
pub struct Dir {
    fs: Filesystem,
    doc: DirDoc,
}

impl Dir {
    pub(crate) fn new(fs: Filesystem, doc: DirDoc) -> Dir {
        Dir { fs, doc }
    }

    pub(crate) fn fs(&self) -> &Filesystem {
        &self.fs
    }

    pub fn inode(&self) -> InodeId {
        self.doc.id
    }

    pub fn mod_time(&self) -> DateTime<Utc> {
        self.doc.body.mod_time
    }

    /// Re-fetch the backing document unconditionally.
    pub async fn refresh(&mut self) -> Result<()> {
        let raw = self.fs.store().get(&self.doc.id.key()).await?;
        match EntityDoc::from_document(&raw)? {
            EntityDoc::Dir(d) => {
                self.doc = d;
                Ok(())
            }
            EntityDoc::File(_) => Err(Error::NotADirectory),
        }
    }

    /// Re-fetch only when the filesystem's auto-refresh option is on.
    /// Every read of the content map goes through this first.
    async fn opt_refresh(&mut self) -> Result<()> {
        if self.fs.auto_refresh() {
            self.refresh().await
        } else {
            Ok(())
        }
    }

    /// Every entry as a (name, entity) pair, including "." and "..".
    /// Order is not significant.
    pub async fn ls(&mut self) -> Result<Vec<(String, Entity)>> {
        self.opt_refresh().await?;
        let entries: Vec<(String, InodeId)> = self
            .doc
            .body
            .content
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect();
        let fs = self.fs.clone();
        try_join_all(entries.into_iter().map(|(name, id)| {
            let fs = fs.clone();
            async move {
                let raw = fs.store().get(&id.key()).await?;
                let doc = EntityDoc::from_document(&raw)?;
                Ok((name, Entity::materialize(&fs, doc)))
            }
        }))
        .await
    }

    pub async fn ls_names(&mut self) -> Result<Vec<String>> {
        self.opt_refresh().await?;
        Ok(self.doc.body.content.keys().cloned().collect())
    }

    pub async fn ls_inodes(&mut self) -> Result<Vec<InodeId>> {
        self.opt_refresh().await?;
        Ok(self.doc.body.content.values().copied().collect())
    }

    /// Resolve a path relative to this directory.
    pub async fn get(&mut self, path: &str) -> Result<Entity> {
        self.opt_refresh().await?;
        let doc =
            path::resolve_from(self.fs.store(), EntityDoc::Dir(self.doc.clone()), path).await?;
        Ok(Entity::materialize(&self.fs, doc))
    }

    /// Reconstruct this directory's absolute path by walking ".." links
    /// up to the self-referential root.
    pub async fn path(&self) -> Result<String> {
        let mut segments: Vec<String> = Vec::new();
        let mut doc = self.doc.clone();
        loop {
            let parent_id = structural_parent(&doc)?;
            if parent_id == doc.id {
                segments.reverse();
                return Ok(format!("/{}", segments.join("/")));
            }
            let raw = self.fs.store().get(&parent_id.key()).await?;
            let parent = match EntityDoc::from_document(&raw)? {
                EntityDoc::Dir(d) => d,
                EntityDoc::File(_) => return Err(Error::NotADirectory),
            };
            let name = parent
                .body
                .content
                .iter()
                .find(|(name, id)| **id == doc.id && *name != "." && *name != "..")
                .map(|(name, _)| name.clone())
                .ok_or_else(|| Error::not_found(doc.id.key()))?;
            segments.push(name);
            doc = parent;
        }
    }

    /// Create a subdirectory. Fails with `AlreadyExists` if the name is
    /// taken, unless `free_name` asked for collision avoidance.
    pub async fn mkdir(&mut self, name: &str, options: MkdirOptions) -> Result<Dir> {
        let name = if options.free_name {
            self.free_name(name).await?
        } else {
            name.to_string()
        };

        let inode = self.fs.next_inode().await?;
        let child = {
            let _guard = self.fs.locks().wait(&write_lock(&self.doc.id.key())).await;
            // Refresh inside the critical section: the snapshot may be
            // stale, and the write below must carry the current revision.
            self.refresh().await?;
            if self.doc.body.content.contains_key(&name) {
                return Err(Error::already_exists(&name));
            }
            let mut child = Typed {
                id: inode,
                rev: 0,
                body: DirBody::new(inode, self.doc.id, Utc::now()),
            };
            child.rev = self.fs.store().put(child.to_document()?).await?.rev;
            self.doc.body.content.insert(name.clone(), inode);
            self.doc.rev = self.fs.store().put(self.doc.to_document()?).await?.rev;
            child
        };

        let new_dir = Dir::new(self.fs.clone(), child);
        self.fs.emit(FsEvent::Mkdir {
            dir: self.doc.id,
            name: name.clone(),
            entity: Entity::Dir(new_dir.clone()),
        });
        self.fs.emit(FsEvent::Create {
            dir: self.doc.id,
            name,
            entity: Entity::Dir(new_dir.clone()),
        });
        Ok(new_dir)
    }

    /// Create a file with the given payload. Binary payloads are base64
    /// transcoded for storage; `size` records the original byte length.
    pub async fn mkfile<C: Into<FileContent>>(
        &mut self,
        name: &str,
        content: C,
        options: MkfileOptions,
    ) -> Result<File> {
        let content = content.into();
        let name = if options.free_name {
            self.free_name(name).await?
        } else {
            name.to_string()
        };

        let (stored, encoding) = content.to_stored();
        let inode = self.fs.next_inode().await?;
        let child = {
            let _guard = self.fs.locks().wait(&write_lock(&self.doc.id.key())).await;
            self.refresh().await?;
            if self.doc.body.content.contains_key(&name) {
                return Err(Error::already_exists(&name));
            }
            let mut child = Typed {
                id: inode,
                rev: 0,
                body: FileBody {
                    content: stored,
                    size: content.size(),
                    encoding,
                    mime_type: options.mime_type,
                    mod_time: options.mod_time.unwrap_or_else(Utc::now),
                    links: 1,
                },
            };
            child.rev = self.fs.store().put(child.to_document()?).await?.rev;
            self.doc.body.content.insert(name.clone(), inode);
            self.doc.rev = self.fs.store().put(self.doc.to_document()?).await?.rev;
            child
        };

        let new_file = File::new(self.fs.clone(), child);
        self.fs.emit(FsEvent::Mkfile {
            dir: self.doc.id,
            name: name.clone(),
            entity: Entity::File(new_file.clone()),
        });
        self.fs.emit(FsEvent::Create {
            dir: self.doc.id,
            name,
            entity: Entity::File(new_file.clone()),
        });
        Ok(new_file)
    }

    /// Find a name not present in this directory, counting up from the
    /// requested one: `foo`, `foo(2)`, `foo(3)`, with any 3-4 character
    /// extension preserved (`bat.abc`, `bat(2).abc`).
    ///
    /// Advisory only: no lock is held while probing, so the existence
    /// re-check mkdir and mkfile perform under the parent lock is what
    /// actually prevents duplicates.
    pub async fn free_name(&mut self, name: &str) -> Result<String> {
        let (base, ext) = match NAME_EXT.captures(name) {
            Some(caps) => (caps[1].to_string(), Some(caps[2].to_string())),
            None => (name.to_string(), None),
        };

        self.opt_refresh().await?;
        let content = &self.doc.body.content;

        let plain = match &ext {
            Some(ext) => format!("{base}.{ext}"),
            None => base.clone(),
        };
        if !content.contains_key(&plain) {
            return Ok(plain);
        }
        let mut n = 2u64;
        loop {
            let candidate = match &ext {
                Some(ext) => format!("{base}({n}).{ext}"),
                None => format!("{base}({n})"),
            };
            if !content.contains_key(&candidate) {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Remove the named entry and its document. Directories must be down
    /// to their structural "." and ".." entries first.
    pub async fn remove(&mut self, name: &str) -> Result<()> {
        if name == "." || name == ".." {
            return Err(Error::remove_structural(name));
        }

        self.opt_refresh().await?;
        let Some(&target) = self.doc.body.content.get(name) else {
            return Err(Error::no_such_entry(name));
        };

        let raw = self.fs.store().get(&target.key()).await?;
        if let EntityDoc::Dir(dir) = EntityDoc::from_document(&raw)? {
            if !dir.body.is_empty() {
                return Err(Error::DirectoryNotEmpty);
            }
        }
        self.fs.store().remove(&raw).await?;

        self.doc.body.content.remove(name);
        self.doc.rev = self.fs.store().put(self.doc.to_document()?).await?.rev;

        self.fs.emit(FsEvent::Remove {
            dir: self.doc.id,
            name: name.to_string(),
        });
        Ok(())
    }

    /// Move the named entry. A `new_path` without "/" renames within this
    /// directory; otherwise the prefix up to the last "/" names a
    /// destination directory resolved from the filesystem root and the
    /// suffix is the new name.
    pub async fn rename(&mut self, old_name: &str, new_path: &str) -> Result<()> {
        self.opt_refresh().await?;

        let (mut dst, new_name) = if !new_path.contains('/') {
            (None, new_path.to_string())
        } else {
            let Some((prefix, suffix)) = new_path.rsplit_once('/') else {
                return Err(Error::bad_destination(new_path));
            };
            if suffix.is_empty() {
                return Err(Error::bad_destination(new_path));
            }
            let dir = self.fs.get(prefix).await?.into_dir()?;
            if dir.inode() == self.doc.id {
                (None, suffix.to_string())
            } else {
                (Some(dir), suffix.to_string())
            }
        };

        let Some(&moved) = self.doc.body.content.get(old_name) else {
            return Err(Error::not_found(old_name));
        };
        let dst_content = match &dst {
            Some(dir) => &dir.doc.body.content,
            None => &self.doc.body.content,
        };
        if dst_content.contains_key(&new_name) {
            return Err(Error::already_exists(&new_name));
        }

        if let Some(dst_dir) = &dst {
            self.guard_cycle(moved, dst_dir).await?;
        }

        match dst.as_mut() {
            None => {
                // Same document: one write swaps the key.
                self.doc.body.content.insert(new_name.clone(), moved);
                self.doc.body.content.remove(old_name);
                self.doc.rev = self.fs.store().put(self.doc.to_document()?).await?.rev;
            }
            Some(dst_dir) => {
                // Destination first, then source. Between the two writes
                // the entity is reachable under both names.
                dst_dir.doc.body.content.insert(new_name.clone(), moved);
                dst_dir.doc.rev = self.fs.store().put(dst_dir.doc.to_document()?).await?.rev;
                self.doc.body.content.remove(old_name);
                self.doc.rev = self.fs.store().put(self.doc.to_document()?).await?.rev;
            }
        }

        let dst_inode = dst.as_ref().map_or(self.doc.id, Dir::inode);
        self.fs.emit(FsEvent::Move {
            src_dir: self.doc.id,
            old_name: old_name.to_string(),
            dst_dir: dst_inode,
            new_name,
            new_path: new_path.to_string(),
        });
        Ok(())
    }

    /// Reject moving a directory underneath this directory's own subtree:
    /// walk the destination's ancestry; hitting this directory before the
    /// self-referential root is a cycle. Files are exempt since a file
    /// cannot contain the destination.
    async fn guard_cycle(&self, moved: InodeId, dst: &Dir) -> Result<()> {
        let raw = self.fs.store().get(&moved.key()).await?;
        if matches!(EntityDoc::from_document(&raw)?, EntityDoc::File(_)) {
            return Ok(());
        }

        let mut cursor = dst.doc.clone();
        loop {
            let parent_id = structural_parent(&cursor)?;
            if parent_id == cursor.id {
                return Ok(());
            }
            if parent_id == self.doc.id {
                return Err(Error::MoveIntoSelf);
            }
            let raw = self.fs.store().get(&parent_id.key()).await?;
            cursor = match EntityDoc::from_document(&raw)? {
                EntityDoc::Dir(d) => d,
                EntityDoc::File(_) => return Err(Error::NotADirectory),
            };
        }
    }
}

fn structural_parent(doc: &DirDoc) -> Result<InodeId> {
    doc.body
        .content
        .get("..")
        .copied()
        .ok_or_else(|| Error::bad_document(doc.id.key(), "missing \"..\" entry"))
}
