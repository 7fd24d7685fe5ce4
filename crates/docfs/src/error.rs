use docstore::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by filesystem operations.
///
/// Everything propagates to the caller; the only local recovery anywhere in
/// the crate is lock release on the failure path, which RAII guards handle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A path segment or rename source that is not in the directory.
    #[error("\"{0}\" not found")]
    NotFound(String),

    /// A remove target that is not in the directory.
    #[error("no such file or directory; \"{0}\" not found")]
    NoSuchEntry(String),

    #[error("not a directory")]
    NotADirectory,

    #[error("not a file")]
    NotAFile,

    #[error("\"{0}\" already exists")]
    AlreadyExists(String),

    /// Removing "." or ".." by name. These entries are structural.
    #[error("cannot delete \"{0}\" (structural entry)")]
    RemoveStructural(String),

    #[error("directory not empty")]
    DirectoryNotEmpty,

    #[error("cannot move an entity to a subdirectory of itself")]
    MoveIntoSelf,

    /// Rename destination ending in "/" or otherwise naming no entry.
    #[error("destination \"{0}\" must be an entry path, not a directory")]
    BadDestination(String),

    /// Absolute lookup with a path that does not begin with "/".
    #[error("path \"{0}\" does not begin with /")]
    PathFormat(String),

    /// A store document whose type tag is neither "dir" nor "file".
    #[error("invalid entity type \"{0}\" in store document")]
    InvalidEntityType(String),

    #[error("encoding \"{0}\" unknown/unsupported")]
    UnsupportedEncoding(String),

    /// A document that exists but does not deserialize to its schema.
    #[error("malformed document \"{0}\": {1}")]
    BadDocument(String, String),

    #[error("filesystem unformatted/empty, call format")]
    Unformatted,

    #[error("filesystem corrupt/unformatted/invalid")]
    Corrupt,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        Error::NotFound(name.into())
    }

    pub fn no_such_entry<S: Into<String>>(name: S) -> Self {
        Error::NoSuchEntry(name.into())
    }

    pub fn already_exists<S: Into<String>>(name: S) -> Self {
        Error::AlreadyExists(name.into())
    }

    pub fn remove_structural<S: Into<String>>(name: S) -> Self {
        Error::RemoveStructural(name.into())
    }

    pub fn bad_destination<S: Into<String>>(path: S) -> Self {
        Error::BadDestination(path.into())
    }

    pub fn path_format<S: Into<String>>(path: S) -> Self {
        Error::PathFormat(path.into())
    }

    pub fn invalid_entity_type<S: Into<String>>(tag: S) -> Self {
        Error::InvalidEntityType(tag.into())
    }

    pub fn unsupported_encoding<S: Into<String>>(encoding: S) -> Self {
        Error::UnsupportedEncoding(encoding.into())
    }

    pub fn bad_document<S: Into<String>, E: std::fmt::Display>(id: S, err: E) -> Self {
        Error::BadDocument(id.into(), err.to_string())
    }
}
