use thiserror::Error;

/// Failures callers react to programmatically. Everything else travels as
/// an opaque `eyre` report.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The referenced entity is gone. Bubbles up untouched and is never
    /// retried.
    #[error("{entity} '{id}' was not found")]
    NotFound { entity: &'static str, id: String },

    /// A multi-write unit stopped partway. `completed` counts the writes
    /// that were applied before the failure.
    #[error("write unit stopped after {completed} write(s): {cause}")]
    PartialCommit { completed: usize, cause: String },
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        StorageError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn partial_commit(completed: usize, cause: &eyre::Report) -> Self {
        StorageError::PartialCommit {
            completed,
            cause: format!("{cause}"),
        }
    }

    pub fn is_not_found(report: &eyre::Report) -> bool {
        matches!(
            report.downcast_ref::<StorageError>(),
            Some(StorageError::NotFound { .. })
        )
    }

    pub fn is_partial_commit(report: &eyre::Report) -> bool {
        matches!(
            report.downcast_ref::<StorageError>(),
            Some(StorageError::PartialCommit { .. })
        )
    }
}
