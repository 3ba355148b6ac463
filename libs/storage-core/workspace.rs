use crate::profile::UserId;
use derive_builder::Builder;
use serde_derive::{Deserialize, Serialize};

pub type WorkspaceId = String;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, Builder)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    /// Unified emoji codepoint shown next to the workspace name.
    #[builder(default)]
    pub icon_unified: String,
    pub owner: UserId,
    #[builder(default)]
    pub members: Vec<UserId>,
    #[builder(default)]
    pub requests: Vec<UserId>,
    pub created_at: u64,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_unified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<Vec<UserId>>,
}

impl WorkspaceUpdate {
    pub fn set_name(mut self, value: String) -> Self {
        self.name = Some(value);
        self
    }

    pub fn set_icon_unified(mut self, value: String) -> Self {
        self.icon_unified = Some(value);
        self
    }

    pub fn set_members(mut self, value: Vec<UserId>) -> Self {
        self.members = Some(value);
        self
    }

    pub fn set_requests(mut self, value: Vec<UserId>) -> Self {
        self.requests = Some(value);
        self
    }

    pub fn merge_with_workspace(self, workspace: &Workspace) -> Workspace {
        Workspace {
            id: workspace.id.clone(),
            name: self.name.unwrap_or(workspace.name.clone()),
            icon_unified: self.icon_unified.unwrap_or(workspace.icon_unified.clone()),
            owner: workspace.owner.clone(),
            members: self.members.unwrap_or(workspace.members.clone()),
            requests: self.requests.unwrap_or(workspace.requests.clone()),
            created_at: workspace.created_at,
        }
    }

    pub fn into_patch(self) -> eyre::Result<serde_json::Value> {
        serde_json::to_value(self).map_err(From::from)
    }
}
