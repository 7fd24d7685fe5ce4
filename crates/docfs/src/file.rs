use chrono::{DateTime, Utc};

use crate::content::FileContent;
use crate::doc::{EntityDoc, FileDoc, InodeId};
use crate::error::{Error, Result};
use crate::fs::Filesystem;

/// Options for a content write.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Replaces the stored mime type; `None` clears it.
    pub mime_type: Option<String>,
    /// Modification stamp override; defaults to now.
    pub mod_time: Option<DateTime<Utc>>,
}

/// File entity: a snapshot of a file document plus its owning filesystem.
#[derive(Debug, Clone)]
pub struct File {
    fs: Filesystem,
    doc: FileDoc,
}

impl File {
    pub(crate) fn new(fs: Filesystem, doc: FileDoc) -> File {
        File { fs, doc }
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

    /// Byte length of the original payload, not of the stored form.
    pub fn size(&self) -> u64 {
        self.doc.body.size
    }

    pub fn encoding(&self) -> Option<&str> {
        self.doc.body.encoding.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.doc.body.mime_type.as_deref()
    }

    /// Re-fetch the backing document unconditionally.
    pub async fn refresh(&mut self) -> Result<()> {
        let raw = self.fs.store().get(&self.doc.id.key()).await?;
        match EntityDoc::from_document(&raw)? {
            EntityDoc::File(f) => {
                self.doc = f;
                Ok(())
            }
            EntityDoc::Dir(_) => Err(Error::NotAFile),
        }
    }

    async fn opt_refresh(&mut self) -> Result<()> {
        if self.fs.auto_refresh() {
            self.refresh().await
        } else {
            Ok(())
        }
    }

    /// Read the whole payload: text verbatim, binary decoded from its
    /// stored base64 form.
    pub async fn data(&mut self) -> Result<FileContent> {
        self.opt_refresh().await?;
        FileContent::from_stored(&self.doc.body)
    }

    /// Replace the payload in place (same inode, new revision) and return
    /// the canonical round-tripped value.
    pub async fn write<C: Into<FileContent>>(
        &mut self,
        content: C,
        options: WriteOptions,
    ) -> Result<FileContent> {
        let content = content.into();
        let (stored, encoding) = content.to_stored();

        self.doc.body.content = stored;
        self.doc.body.size = content.size();
        self.doc.body.encoding = encoding;
        self.doc.body.mime_type = options.mime_type;
        self.doc.body.mod_time = options.mod_time.unwrap_or_else(Utc::now);

        let receipt = self.fs.store().put(self.doc.to_document()?).await?;
        self.doc.rev = receipt.rev;

        FileContent::from_stored(&self.doc.body)
    }
}
