use crate::card::{Card, CardId, CardUpdate};
use crate::column::{Column, ColumnId, ColumnUpdate};
use crate::profile::{Profile, ProfileUpdate, UserId};
use crate::subscription::{ChangeCallback, SubscriptionGuard};
use crate::workspace::{Workspace, WorkspaceId, WorkspaceUpdate};
use crate::PinFuture;
use derive_more::{Deref, DerefMut};

#[derive(Deref, DerefMut)]
#[deref(forward)]
#[deref_mut(forward)]
pub struct StorageBox(pub Box<dyn Storage>);

impl StorageBox {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self(Box::new(storage))
    }
}

/// The remote store contract. List operations return entities sorted by
/// their index field ascending (ties broken by id); create operations
/// return the definitive id; every mutation is last-writer-wins at the
/// field level.
pub trait Storage: Send + Sync {
    fn init(&self, config: &plank_config::CoreConfig) -> PinFuture<eyre::Result<()>>;

    // Columns
    fn list_columns(&self, workspace_id: WorkspaceId) -> PinFuture<eyre::Result<Vec<Column>>>;
    fn create_column(&self, column: Column) -> PinFuture<eyre::Result<ColumnId>>;
    fn update_column(
        &self,
        column_id: ColumnId,
        update: ColumnUpdate,
    ) -> PinFuture<eyre::Result<()>>;

    // Deleting a column cascades to its cards
    fn delete_column(&self, column_id: ColumnId) -> PinFuture<eyre::Result<()>>;

    // The two columns exchange index values, nothing else is written
    fn swap_column_positions(
        &self,
        active_id: ColumnId,
        active_index: u32,
        over_id: ColumnId,
        over_index: u32,
    ) -> PinFuture<eyre::Result<()>>;

    // Assigns column_index = position for every entry
    fn sync_column_order(&self, columns: Vec<Column>) -> PinFuture<eyre::Result<()>>;

    // Cards
    fn list_cards(&self, column_id: ColumnId) -> PinFuture<eyre::Result<Vec<Card>>>;
    fn get_card(&self, card_id: CardId) -> PinFuture<eyre::Result<Card>>;
    fn create_card(&self, card: Card) -> PinFuture<eyre::Result<CardId>>;
    fn update_card(&self, card_id: CardId, update: CardUpdate) -> PinFuture<eyre::Result<()>>;
    fn delete_card(&self, card_id: CardId) -> PinFuture<eyre::Result<()>>;

    // Same-column reorder: the two cards exchange index values
    fn swap_card_positions(
        &self,
        active_id: CardId,
        active_index: u32,
        over_id: CardId,
        over_index: u32,
    ) -> PinFuture<eyre::Result<()>>;

    /// Cross-column move as one retryable unit: rewrites the card's parent
    /// and index, then fixes both membership lists. NotFound propagates
    /// without retry.
    fn move_card_to_column(
        &self,
        card_id: CardId,
        source_column_id: ColumnId,
        target_column_id: ColumnId,
        target_index: u32,
    ) -> PinFuture<eyre::Result<()>>;

    // Assigns card_index = position for every entry, column_id included
    fn sync_card_order(&self, cards: Vec<Card>) -> PinFuture<eyre::Result<()>>;

    // Rebuilds the denormalized membership list from the cards' column_id
    fn refresh_column_membership(&self, column_id: ColumnId) -> PinFuture<eyre::Result<()>>;

    // Workspaces
    fn get_workspace(&self, workspace_id: WorkspaceId) -> PinFuture<eyre::Result<Workspace>>;

    // Every workspace the user owns or joined
    fn list_workspaces(&self, user_id: UserId) -> PinFuture<eyre::Result<Vec<Workspace>>>;
    fn create_workspace(&self, workspace: Workspace) -> PinFuture<eyre::Result<WorkspaceId>>;
    fn update_workspace(
        &self,
        workspace_id: WorkspaceId,
        update: WorkspaceUpdate,
    ) -> PinFuture<eyre::Result<()>>;

    // Cascades to columns and cards and strips the id from profile shelves
    fn delete_workspace(&self, workspace_id: WorkspaceId) -> PinFuture<eyre::Result<()>>;

    // Membership requests
    fn add_workspace_request(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> PinFuture<eyre::Result<()>>;
    fn remove_workspace_request(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> PinFuture<eyre::Result<()>>;

    // Moves the applicant from requests to members on both sides
    fn accept_workspace_request(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> PinFuture<eyre::Result<()>>;
    fn remove_workspace_member(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> PinFuture<eyre::Result<()>>;

    // Profiles
    fn get_profile(&self, user_id: UserId) -> PinFuture<eyre::Result<Option<Profile>>>;
    fn upsert_profile(&self, profile: Profile) -> PinFuture<eyre::Result<()>>;
    fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> PinFuture<eyre::Result<()>>;
    fn search_profiles(&self, email_prefix: String) -> PinFuture<eyre::Result<Vec<Profile>>>;

    // Subscriptions (payload-less, self-writes included)
    fn subscribe_columns(
        &self,
        workspace_id: WorkspaceId,
        on_change: ChangeCallback,
    ) -> PinFuture<eyre::Result<SubscriptionGuard>>;
    fn subscribe_cards(
        &self,
        column_id: ColumnId,
        on_change: ChangeCallback,
    ) -> PinFuture<eyre::Result<SubscriptionGuard>>;
    fn subscribe_workspace(
        &self,
        workspace_id: WorkspaceId,
        on_change: ChangeCallback,
    ) -> PinFuture<eyre::Result<SubscriptionGuard>>;
}
