pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors reported by a document store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document \"{0}\" not found")]
    NotFound(String),

    #[error("document \"{0}\" update conflict")]
    Conflict(String),

    #[error("store failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        StoreError::NotFound(id.into())
    }

    pub fn conflict<S: Into<String>>(id: S) -> Self {
        StoreError::Conflict(id.into())
    }

    pub fn backend<S: Into<String>>(message: S) -> Self {
        StoreError::Backend(message.into())
    }

    /// True for the "key absent" case, as opposed to transport failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
