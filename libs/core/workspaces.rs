use plank_storage::{Profile, ProfileUpdate, Workspace, WorkspaceId, WorkspaceUpdate};
use tracing::debug;

use crate::{utils, Core, CoreError};

/// Which sidebar shelf an ordering operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfKind {
    Owned,
    Joined,
}

/// The sidebar model: workspaces the user owns and workspaces they joined,
/// each in the user's chosen order.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceShelves {
    pub owned: Vec<Workspace>,
    pub joined: Vec<Workspace>,
}

/// Applies a stored ordering to a fetched pool: listed ids come first in
/// that order, unlisted workspaces are appended in fetch order, and ids
/// with no workspace behind them are dropped.
fn order_shelf(pool: Vec<Workspace>, order: &[WorkspaceId]) -> (Vec<Workspace>, Vec<WorkspaceId>) {
    let mut remaining = pool;
    let mut shelf = Vec::with_capacity(remaining.len());
    for id in order {
        if let Some(position) = remaining.iter().position(|workspace| &workspace.id == id) {
            shelf.push(remaining.remove(position));
        }
    }
    shelf.extend(remaining);

    let repaired = shelf.iter().map(|workspace| workspace.id.clone()).collect();
    (shelf, repaired)
}

impl Core {
    /// Creates or refreshes the caller's profile. Identity fields follow
    /// the sign-in data, shelf orderings survive untouched.
    pub async fn ensure_profile(
        &self,
        user_id: &str,
        email: &str,
        name: &str,
        image_uri: &str,
    ) -> eyre::Result<Profile> {
        let profile = Profile {
            id: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            image_uri: image_uri.to_string(),
            workspace_owner_order: vec![],
            workspace_member_order: vec![],
            workspace_requests: vec![],
        };
        self.storage.upsert_profile(profile).await?;
        self.require_profile(user_id).await
    }

    pub async fn get_profile(&self, user_id: &str) -> eyre::Result<Option<Profile>> {
        self.storage.get_profile(user_id.to_string()).await
    }

    /// Profiles whose email starts with the given prefix. An empty prefix
    /// matches nobody.
    pub async fn search_users(&self, email_prefix: &str) -> eyre::Result<Vec<Profile>> {
        if email_prefix.is_empty() {
            return Ok(vec![]);
        }
        self.storage.search_profiles(email_prefix.to_string()).await
    }

    /// Creates a workspace owned by `actor` and appends it to their owned
    /// shelf.
    pub async fn create_workspace(
        &self,
        actor: &str,
        name: &str,
        icon_unified: &str,
    ) -> eyre::Result<WorkspaceId> {
        let workspace = Workspace {
            id: String::new(),
            name: name.to_string(),
            icon_unified: icon_unified.to_string(),
            owner: actor.to_string(),
            members: vec![],
            requests: vec![],
            created_at: utils::unix_now(),
        };
        let workspace_id = self.storage.create_workspace(workspace).await?;
        debug!(workspace = %workspace_id, owner = %actor, "workspace created");
        Ok(workspace_id)
    }

    pub async fn get_workspace(&self, workspace_id: &str) -> eyre::Result<Workspace> {
        self.storage.get_workspace(workspace_id.to_string()).await
    }

    /// Renames a workspace or changes its icon. Owner only.
    pub async fn update_workspace_meta(
        &self,
        actor: &str,
        workspace_id: &str,
        name: Option<String>,
        icon_unified: Option<String>,
    ) -> eyre::Result<()> {
        self.require_owner(actor, workspace_id).await?;
        if name.is_none() && icon_unified.is_none() {
            return Ok(());
        }

        let mut update = WorkspaceUpdate::default();
        if let Some(name) = name {
            update = update.set_name(name);
        }
        if let Some(icon) = icon_unified {
            update = update.set_icon_unified(icon);
        }
        self.storage
            .update_workspace(workspace_id.to_string(), update)
            .await
    }

    /// Deletes a workspace together with its columns and cards. Owner only.
    pub async fn delete_workspace(&self, actor: &str, workspace_id: &str) -> eyre::Result<()> {
        self.require_owner(actor, workspace_id).await?;
        self.storage.delete_workspace(workspace_id.to_string()).await
    }

    /// Both shelves in the user's chosen order. Workspaces missing from an
    /// ordering are appended in fetch order, dangling ids are pruned, and
    /// the repaired ordering is written back.
    pub async fn list_workspaces(&self, actor: &str) -> eyre::Result<WorkspaceShelves> {
        let profile = self.require_profile(actor).await?;
        let all = self.storage.list_workspaces(actor.to_string()).await?;

        let (owned_pool, joined_pool): (Vec<Workspace>, Vec<Workspace>) = all
            .into_iter()
            .partition(|workspace| workspace.owner == actor);

        let (owned, owned_order) = order_shelf(owned_pool, &profile.workspace_owner_order);
        let (joined, joined_order) = order_shelf(joined_pool, &profile.workspace_member_order);

        if owned_order != profile.workspace_owner_order
            || joined_order != profile.workspace_member_order
        {
            debug!(user = %actor, "repairing shelf ordering");
            let update = ProfileUpdate::default()
                .set_workspace_owner_order(owned_order)
                .set_workspace_member_order(joined_order);
            self.storage.update_profile(actor.to_string(), update).await?;
        }

        Ok(WorkspaceShelves { owned, joined })
    }

    /// Persists a full shelf ordering as handed over by the sidebar.
    pub async fn reorder_shelf(
        &self,
        actor: &str,
        shelf: ShelfKind,
        order: Vec<WorkspaceId>,
    ) -> eyre::Result<()> {
        let update = match shelf {
            ShelfKind::Owned => ProfileUpdate::default().set_workspace_owner_order(order),
            ShelfKind::Joined => ProfileUpdate::default().set_workspace_member_order(order),
        };
        self.storage.update_profile(actor.to_string(), update).await
    }

    /// Files a membership request. Requests from the owner or an existing
    /// member are ignored.
    pub async fn request_to_join(&self, actor: &str, workspace_id: &str) -> eyre::Result<()> {
        let workspace = self.storage.get_workspace(workspace_id.to_string()).await?;
        if workspace.owner == actor || workspace.members.iter().any(|member| member == actor) {
            return Ok(());
        }
        self.storage
            .add_workspace_request(workspace_id.to_string(), actor.to_string())
            .await
    }

    /// Withdraws the caller's own pending request.
    pub async fn cancel_request(&self, actor: &str, workspace_id: &str) -> eyre::Result<()> {
        self.storage
            .remove_workspace_request(workspace_id.to_string(), actor.to_string())
            .await
    }

    /// Turns a pending request into a membership. Owner only.
    pub async fn accept_request(
        &self,
        actor: &str,
        workspace_id: &str,
        applicant: &str,
    ) -> eyre::Result<()> {
        self.require_owner(actor, workspace_id).await?;
        self.storage
            .accept_workspace_request(workspace_id.to_string(), applicant.to_string())
            .await
    }

    /// Rejects a pending request. Owner only.
    pub async fn decline_request(
        &self,
        actor: &str,
        workspace_id: &str,
        applicant: &str,
    ) -> eyre::Result<()> {
        self.require_owner(actor, workspace_id).await?;
        self.storage
            .remove_workspace_request(workspace_id.to_string(), applicant.to_string())
            .await
    }

    /// Removes a member from a workspace. Owner only.
    pub async fn remove_member(
        &self,
        actor: &str,
        workspace_id: &str,
        member: &str,
    ) -> eyre::Result<()> {
        self.require_owner(actor, workspace_id).await?;
        self.storage
            .remove_workspace_member(workspace_id.to_string(), member.to_string())
            .await
    }

    async fn require_profile(&self, user_id: &str) -> eyre::Result<Profile> {
        self.storage
            .get_profile(user_id.to_string())
            .await?
            .ok_or_else(|| CoreError::not_found("profile", user_id).into())
    }

    async fn require_owner(&self, actor: &str, workspace_id: &str) -> eyre::Result<Workspace> {
        let workspace = self.storage.get_workspace(workspace_id.to_string()).await?;
        if workspace.owner != actor {
            return Err(CoreError::not_owner(actor, workspace_id).into());
        }
        Ok(workspace)
    }
}
