use chrono::NaiveDate;
use live_document_db::prelude::Document;
use live_document_db::Document;
use plank_storage_core::{Card, Column, Profile, Subtask, Workspace};

pub(crate) const WORKSPACES_COLLECTION: &str = "workspaces";
pub(crate) const COLUMNS_COLLECTION: &str = "columns";
pub(crate) const CARDS_COLLECTION: &str = "cards";
pub(crate) const PROFILES_COLLECTION: &str = "profiles";

#[derive(PartialEq, Debug, Clone, Document)]
pub(crate) struct WorkspaceDocument {
    #[document(id)]
    pub id: String,
    pub name: String,
    pub icon_unified: String,
    pub owner: String,
    pub members: Vec<String>,
    pub requests: Vec<String>,
    pub created_at: u64,
}

#[derive(PartialEq, Debug, Clone, Document)]
pub(crate) struct ColumnDocument {
    #[document(id)]
    pub id: String,
    pub workspace_id: String,
    pub title: String,
    pub column_index: u32,
    pub cards: Vec<String>,
}

#[derive(PartialEq, Debug, Clone, Document)]
pub(crate) struct CardDocument {
    #[document(id)]
    pub id: String,
    pub column_id: String,
    pub card_index: u32,
    pub content: String,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: String,
    pub tasks: Vec<Subtask>,
}

#[derive(PartialEq, Debug, Clone, Document)]
pub(crate) struct ProfileDocument {
    #[document(id)]
    pub id: String,
    pub email: String,
    pub name: String,
    pub image_uri: String,
    pub workspace_owner_order: Vec<String>,
    pub workspace_member_order: Vec<String>,
    pub workspace_requests: Vec<String>,
}

impl From<Workspace> for WorkspaceDocument {
    fn from(workspace: Workspace) -> Self {
        WorkspaceDocument {
            id: workspace.id,
            name: workspace.name,
            icon_unified: workspace.icon_unified,
            owner: workspace.owner,
            members: workspace.members,
            requests: workspace.requests,
            created_at: workspace.created_at,
        }
    }
}

impl From<WorkspaceDocument> for Workspace {
    fn from(document: WorkspaceDocument) -> Self {
        Workspace {
            id: document.id,
            name: document.name,
            icon_unified: document.icon_unified,
            owner: document.owner,
            members: document.members,
            requests: document.requests,
            created_at: document.created_at,
        }
    }
}

impl From<Column> for ColumnDocument {
    fn from(column: Column) -> Self {
        ColumnDocument {
            id: column.id,
            workspace_id: column.workspace_id,
            title: column.title,
            column_index: column.column_index,
            cards: column.cards,
        }
    }
}

impl From<ColumnDocument> for Column {
    fn from(document: ColumnDocument) -> Self {
        Column {
            id: document.id,
            workspace_id: document.workspace_id,
            title: document.title,
            column_index: document.column_index,
            cards: document.cards,
        }
    }
}

impl From<Card> for CardDocument {
    fn from(card: Card) -> Self {
        CardDocument {
            id: card.id,
            column_id: card.column_id,
            card_index: card.card_index,
            content: card.content,
            due_date: card.due_date,
            assignee_id: card.assignee_id,
            tasks: card.tasks,
        }
    }
}

impl From<CardDocument> for Card {
    fn from(document: CardDocument) -> Self {
        Card {
            id: document.id,
            column_id: document.column_id,
            card_index: document.card_index,
            content: document.content,
            due_date: document.due_date,
            assignee_id: document.assignee_id,
            tasks: document.tasks,
        }
    }
}

impl From<Profile> for ProfileDocument {
    fn from(profile: Profile) -> Self {
        ProfileDocument {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            image_uri: profile.image_uri,
            workspace_owner_order: profile.workspace_owner_order,
            workspace_member_order: profile.workspace_member_order,
            workspace_requests: profile.workspace_requests,
        }
    }
}

impl From<ProfileDocument> for Profile {
    fn from(document: ProfileDocument) -> Self {
        Profile {
            id: document.id,
            email: document.email,
            name: document.name,
            image_uri: document.image_uri,
            workspace_owner_order: document.workspace_owner_order,
            workspace_member_order: document.workspace_member_order,
            workspace_requests: document.workspace_requests,
        }
    }
}
