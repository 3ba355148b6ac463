use crate::workspace::WorkspaceId;
use derive_builder::Builder;
use serde_derive::{Deserialize, Serialize};

pub type UserId = String;

/// Per-user record. The two order lists are the user's sidebar shelves:
/// workspaces they own and workspaces they joined, in display order.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, Builder)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[builder(default)]
    pub image_uri: String,
    #[builder(default)]
    pub workspace_owner_order: Vec<WorkspaceId>,
    #[builder(default)]
    pub workspace_member_order: Vec<WorkspaceId>,
    #[builder(default)]
    pub workspace_requests: Vec<WorkspaceId>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_owner_order: Option<Vec<WorkspaceId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_member_order: Option<Vec<WorkspaceId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_requests: Option<Vec<WorkspaceId>>,
}

impl ProfileUpdate {
    pub fn set_email(mut self, value: String) -> Self {
        self.email = Some(value);
        self
    }

    pub fn set_name(mut self, value: String) -> Self {
        self.name = Some(value);
        self
    }

    pub fn set_image_uri(mut self, value: String) -> Self {
        self.image_uri = Some(value);
        self
    }

    pub fn set_workspace_owner_order(mut self, value: Vec<WorkspaceId>) -> Self {
        self.workspace_owner_order = Some(value);
        self
    }

    pub fn set_workspace_member_order(mut self, value: Vec<WorkspaceId>) -> Self {
        self.workspace_member_order = Some(value);
        self
    }

    pub fn set_workspace_requests(mut self, value: Vec<WorkspaceId>) -> Self {
        self.workspace_requests = Some(value);
        self
    }

    pub fn merge_with_profile(self, profile: &Profile) -> Profile {
        Profile {
            id: profile.id.clone(),
            email: self.email.unwrap_or(profile.email.clone()),
            name: self.name.unwrap_or(profile.name.clone()),
            image_uri: self.image_uri.unwrap_or(profile.image_uri.clone()),
            workspace_owner_order: self
                .workspace_owner_order
                .unwrap_or(profile.workspace_owner_order.clone()),
            workspace_member_order: self
                .workspace_member_order
                .unwrap_or(profile.workspace_member_order.clone()),
            workspace_requests: self
                .workspace_requests
                .unwrap_or(profile.workspace_requests.clone()),
        }
    }

    pub fn into_patch(self) -> eyre::Result<serde_json::Value> {
        serde_json::to_value(self).map_err(From::from)
    }
}
