use plank_storage::StorageError;
use thiserror::Error;

/// Engine-level failures a caller can branch on. Store-level classes
/// (NotFound, partial commits) travel as [`StorageError`] inside the same
/// `eyre` reports and are covered by the predicates below.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{entity} '{id}' was not found")]
    NotFound { entity: &'static str, id: String },

    #[error("user '{actor}' does not own workspace '{workspace_id}'")]
    NotOwner { actor: String, workspace_id: String },

    #[error("user '{actor}' is not a member of workspace '{workspace_id}'")]
    NotMember { actor: String, workspace_id: String },
}

impl CoreError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn not_owner(actor: &str, workspace_id: &str) -> Self {
        CoreError::NotOwner {
            actor: actor.to_string(),
            workspace_id: workspace_id.to_string(),
        }
    }

    pub(crate) fn not_member(actor: &str, workspace_id: &str) -> Self {
        CoreError::NotMember {
            actor: actor.to_string(),
            workspace_id: workspace_id.to_string(),
        }
    }

    pub fn is_not_found(report: &eyre::Report) -> bool {
        matches!(
            report.downcast_ref::<CoreError>(),
            Some(CoreError::NotFound { .. })
        ) || StorageError::is_not_found(report)
    }

    pub fn is_forbidden(report: &eyre::Report) -> bool {
        matches!(
            report.downcast_ref::<CoreError>(),
            Some(CoreError::NotOwner { .. } | CoreError::NotMember { .. })
        )
    }

    pub fn is_partial_commit(report: &eyre::Report) -> bool {
        StorageError::is_partial_commit(report)
    }
}
