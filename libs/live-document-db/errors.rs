use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document '{id}' not found in collection '{collection}'")]
    DocumentNotFound { collection: String, id: String },
    #[error("document '{id}' already exists in collection '{collection}'")]
    DuplicateDocument { collection: String, id: String },
    #[error("couldn't parse store document: {0}")]
    DocumentParseError(String),
    #[error("operation failed: {0}")]
    OperationFailed(String),
    #[error("unknown store error")]
    Unknown,
}

impl StoreError {
    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        Self::DocumentNotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(collection: &str, id: &str) -> Self {
        Self::DuplicateDocument {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn parse_error<T: std::fmt::Display>(err: T) -> Self {
        Self::DocumentParseError(err.to_string())
    }

    pub(crate) fn operation_failed<T: std::fmt::Display>(err: T) -> Self {
        Self::OperationFailed(err.to_string())
    }

    /// NotFound must never be retried by callers wrapping store operations
    /// in a retry loop, so it gets a dedicated check.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DocumentNotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
