use super::config::LiveStorageConfig;
use super::documents::{
    CardDocument, ColumnDocument, ProfileDocument, WorkspaceDocument, CARDS_COLLECTION,
    COLUMNS_COLLECTION, PROFILES_COLLECTION, WORKSPACES_COLLECTION,
};
use live_document_db::{Collection, Connection, ConnectionConfig, Filter, Query, StoreError};
use plank_storage_core::{
    Card, CardId, CardUpdate, ChangeCallback, Column, ColumnId, ColumnUpdate, PinFuture, Profile,
    ProfileUpdate, Storage, StorageBox, StorageConfig, StorageError, SubscriptionGuard, UserId,
    Workspace, WorkspaceId, WorkspaceUpdate,
};
use retry::delay::Fixed;
use retry::OperationResult;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, trace};

/// Keeps every collection in a shared in-process document database, so
/// concurrently open boards observe each other's writes.
pub struct LiveStorage {
    config: LiveStorageConfig,
    connection: Connection,
}

fn remap_not_found(err: StoreError, entity: &'static str, id: &str) -> eyre::Report {
    if err.is_not_found() {
        eyre::Report::new(StorageError::not_found(entity, id))
    } else {
        eyre::Report::new(err)
    }
}

impl LiveStorage {
    pub fn try_new(config: LiveStorageConfig) -> eyre::Result<Self> {
        let connection = Connection::initialize(
            ConnectionConfig::builder()
                .database_name(config.get_database_name())
                .volatile(config.get_volatile())
                .build(),
        )?;

        Ok(LiveStorage { config, connection })
    }

    fn workspaces(&self) -> Collection {
        self.connection.collection(WORKSPACES_COLLECTION)
    }

    fn columns(&self) -> Collection {
        self.connection.collection(COLUMNS_COLLECTION)
    }

    fn cards(&self) -> Collection {
        self.connection.collection(CARDS_COLLECTION)
    }

    fn profiles(&self) -> Collection {
        self.connection.collection(PROFILES_COLLECTION)
    }

    fn get_workspace_document(&self, workspace_id: &str) -> eyre::Result<WorkspaceDocument> {
        self.workspaces()
            .get::<WorkspaceDocument>(workspace_id)?
            .ok_or_else(|| StorageError::not_found("workspace", workspace_id).into())
    }

    fn get_column_document(&self, column_id: &str) -> eyre::Result<ColumnDocument> {
        self.columns()
            .get::<ColumnDocument>(column_id)?
            .ok_or_else(|| StorageError::not_found("column", column_id).into())
    }

    fn get_card_document(&self, card_id: &str) -> eyre::Result<CardDocument> {
        self.cards()
            .get::<CardDocument>(card_id)?
            .ok_or_else(|| StorageError::not_found("card", card_id).into())
    }

    fn get_profile_document(&self, user_id: &str) -> eyre::Result<ProfileDocument> {
        self.profiles()
            .get::<ProfileDocument>(user_id)?
            .ok_or_else(|| StorageError::not_found("profile", user_id).into())
    }

    fn apply_workspace_patch(
        &self,
        workspace_id: &str,
        update: WorkspaceUpdate,
    ) -> eyre::Result<()> {
        self.workspaces()
            .update_fields(workspace_id, update.into_patch()?)
            .map_err(|err| remap_not_found(err, "workspace", workspace_id))
    }

    fn apply_column_patch(&self, column_id: &str, update: ColumnUpdate) -> eyre::Result<()> {
        self.columns()
            .update_fields(column_id, update.into_patch()?)
            .map_err(|err| remap_not_found(err, "column", column_id))
    }

    fn apply_card_patch(&self, card_id: &str, update: CardUpdate) -> eyre::Result<()> {
        self.cards()
            .update_fields(card_id, update.into_patch()?)
            .map_err(|err| remap_not_found(err, "card", card_id))
    }

    fn apply_profile_patch(&self, user_id: &str, update: ProfileUpdate) -> eyre::Result<()> {
        self.profiles()
            .update_fields(user_id, update.into_patch()?)
            .map_err(|err| remap_not_found(err, "profile", user_id))
    }

    fn add_card_to_membership(&self, column_id: &str, card_id: &str) -> eyre::Result<()> {
        let column = self.get_column_document(column_id)?;
        let mut cards = column.cards;
        if !cards.iter().any(|id| id == card_id) {
            cards.push(card_id.to_string());
            self.apply_column_patch(column_id, ColumnUpdate::default().set_cards(cards))?;
        }
        Ok(())
    }

    // Tolerant on purpose: the membership list of a column that no longer
    // exists has nothing left to repair.
    fn remove_card_from_membership(&self, column_id: &str, card_id: &str) -> eyre::Result<()> {
        let column = match self.columns().get::<ColumnDocument>(column_id)? {
            Some(column) => column,
            None => return Ok(()),
        };
        let mut cards = column.cards;
        let before = cards.len();
        cards.retain(|id| id != card_id);
        if cards.len() != before {
            self.apply_column_patch(column_id, ColumnUpdate::default().set_cards(cards))?;
        }
        Ok(())
    }

    fn create_card_with_membership(&self, card: Card) -> eyre::Result<String> {
        // Checked up front so a card is never created under a dead parent.
        self.get_column_document(&card.column_id)?;
        let column_id = card.column_id.clone();
        let card_id = self.cards().add(&CardDocument::from(card))?;
        self.add_card_to_membership(&column_id, &card_id)?;
        Ok(card_id)
    }

    fn delete_card_with_membership(&self, card_id: &str) -> eyre::Result<()> {
        let card = match self.cards().get::<CardDocument>(card_id)? {
            Some(card) => card,
            None => return Ok(()),
        };
        self.cards().delete(card_id)?;
        self.remove_card_from_membership(&card.column_id, card_id)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn move_card_between_columns(
        &self,
        card_id: &str,
        source_column_id: &str,
        target_column_id: &str,
        target_index: u32,
    ) -> eyre::Result<()> {
        trace!("Move card between columns");
        // The target is checked before anything is written, so a move
        // toward a concurrently deleted column fails with zero writes.
        self.get_column_document(target_column_id)?;

        let update = CardUpdate::default()
            .set_column_id(target_column_id.to_string())
            .set_card_index(target_index);
        self.apply_card_patch(card_id, update)?;

        self.remove_card_from_membership(source_column_id, card_id)?;
        self.add_card_to_membership(target_column_id, card_id)
            .map_err(|cause| {
                if StorageError::is_not_found(&cause) {
                    // The card already points at the vanished target; the
                    // dangling state has to surface rather than retry.
                    eyre::Report::new(StorageError::partial_commit(2, &cause))
                } else {
                    cause
                }
            })?;
        Ok(())
    }

    fn write_column_swap(
        &self,
        active_id: &str,
        active_index: u32,
        over_id: &str,
        over_index: u32,
    ) -> eyre::Result<()> {
        self.apply_column_patch(active_id, ColumnUpdate::default().set_column_index(over_index))?;
        self.apply_column_patch(over_id, ColumnUpdate::default().set_column_index(active_index))?;
        Ok(())
    }

    fn write_card_swap(
        &self,
        active_id: &str,
        active_index: u32,
        over_id: &str,
        over_index: u32,
    ) -> eyre::Result<()> {
        self.apply_card_patch(active_id, CardUpdate::default().set_card_index(over_index))?;
        self.apply_card_patch(over_id, CardUpdate::default().set_card_index(active_index))?;
        Ok(())
    }

    fn write_column_order(&self, columns: &[Column]) -> eyre::Result<()> {
        for (position, column) in columns.iter().enumerate() {
            self.apply_column_patch(
                &column.id,
                ColumnUpdate::default().set_column_index(position as u32),
            )?;
        }
        Ok(())
    }

    fn write_card_order(&self, cards: &[Card]) -> eyre::Result<()> {
        for (position, card) in cards.iter().enumerate() {
            let update = CardUpdate::default()
                .set_column_id(card.column_id.clone())
                .set_card_index(position as u32);
            self.apply_card_patch(&card.id, update)?;
        }
        Ok(())
    }

    fn list_card_documents(&self, column_id: &str) -> eyre::Result<Vec<CardDocument>> {
        let query = Query::filtered(Filter::eq("column_id", column_id)).order_by("card_index");
        Ok(self.cards().find::<CardDocument>(&query)?)
    }

    #[instrument(skip(self))]
    fn rebuild_membership(&self, column_id: &str) -> eyre::Result<()> {
        trace!("Rebuild column membership");
        let ids: Vec<String> = self
            .list_card_documents(column_id)?
            .into_iter()
            .map(|card| card.id)
            .collect();
        self.apply_column_patch(column_id, ColumnUpdate::default().set_cards(ids))
    }

    #[instrument(skip(self))]
    fn delete_column_with_cards(&self, column_id: &str) -> eyre::Result<()> {
        trace!("Delete column and its cards");
        for card in self.list_card_documents(column_id)? {
            self.cards().delete(&card.id)?;
        }
        self.columns().delete(column_id)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete_workspace_with_contents(&self, workspace_id: &str) -> eyre::Result<()> {
        trace!("Delete workspace, its board and its shelf entries");
        let query = Query::filtered(Filter::eq("workspace_id", workspace_id));
        for column in self.columns().find::<ColumnDocument>(&query)? {
            self.delete_column_with_cards(&column.id)?;
        }
        self.workspaces().delete(workspace_id)?;
        self.strip_workspace_from_profiles(workspace_id)?;
        Ok(())
    }

    fn strip_workspace_from_profiles(&self, workspace_id: &str) -> eyre::Result<()> {
        let shelf_fields = [
            "workspace_owner_order",
            "workspace_member_order",
            "workspace_requests",
        ];

        let mut touched: BTreeMap<String, ProfileDocument> = BTreeMap::new();
        for field in shelf_fields {
            let query = Query::filtered(Filter::array_contains(field, workspace_id));
            for profile in self.profiles().find::<ProfileDocument>(&query)? {
                touched.entry(profile.id.clone()).or_insert(profile);
            }
        }

        for (user_id, mut profile) in touched {
            profile.workspace_owner_order.retain(|id| id != workspace_id);
            profile
                .workspace_member_order
                .retain(|id| id != workspace_id);
            profile.workspace_requests.retain(|id| id != workspace_id);
            let update = ProfileUpdate::default()
                .set_workspace_owner_order(profile.workspace_owner_order)
                .set_workspace_member_order(profile.workspace_member_order)
                .set_workspace_requests(profile.workspace_requests);
            self.apply_profile_patch(&user_id, update)?;
        }
        Ok(())
    }

    fn append_owned_workspace(&self, owner: &str, workspace_id: &str) -> eyre::Result<()> {
        let profile = self.get_profile_document(owner)?;
        let mut order = profile.workspace_owner_order;
        if !order.iter().any(|id| id == workspace_id) {
            order.push(workspace_id.to_string());
            self.apply_profile_patch(
                owner,
                ProfileUpdate::default().set_workspace_owner_order(order),
            )?;
        }
        Ok(())
    }

    fn add_request(&self, workspace_id: &str, user_id: &str) -> eyre::Result<()> {
        let workspace = self.get_workspace_document(workspace_id)?;
        let mut requests = workspace.requests;
        if !requests.iter().any(|id| id == user_id) {
            requests.push(user_id.to_string());
            self.apply_workspace_patch(
                workspace_id,
                WorkspaceUpdate::default().set_requests(requests),
            )?;
        }

        let profile = self.get_profile_document(user_id)?;
        let mut pending = profile.workspace_requests;
        if !pending.iter().any(|id| id == workspace_id) {
            pending.push(workspace_id.to_string());
            self.apply_profile_patch(
                user_id,
                ProfileUpdate::default().set_workspace_requests(pending),
            )?;
        }
        Ok(())
    }

    // Removal is a repair and stays quiet when either side is gone.
    fn remove_request(&self, workspace_id: &str, user_id: &str) -> eyre::Result<()> {
        if let Some(workspace) = self.workspaces().get::<WorkspaceDocument>(workspace_id)? {
            let mut requests = workspace.requests;
            let before = requests.len();
            requests.retain(|id| id != user_id);
            if requests.len() != before {
                self.apply_workspace_patch(
                    workspace_id,
                    WorkspaceUpdate::default().set_requests(requests),
                )?;
            }
        }

        if let Some(profile) = self.profiles().get::<ProfileDocument>(user_id)? {
            let mut pending = profile.workspace_requests;
            let before = pending.len();
            pending.retain(|id| id != workspace_id);
            if pending.len() != before {
                self.apply_profile_patch(
                    user_id,
                    ProfileUpdate::default().set_workspace_requests(pending),
                )?;
            }
        }
        Ok(())
    }

    fn accept_request(&self, workspace_id: &str, user_id: &str) -> eyre::Result<()> {
        let workspace = self.get_workspace_document(workspace_id)?;
        let mut requests = workspace.requests;
        requests.retain(|id| id != user_id);
        let mut members = workspace.members;
        if !members.iter().any(|id| id == user_id) {
            members.push(user_id.to_string());
        }
        self.apply_workspace_patch(
            workspace_id,
            WorkspaceUpdate::default()
                .set_requests(requests)
                .set_members(members),
        )?;

        let profile = self.get_profile_document(user_id)?;
        let mut pending = profile.workspace_requests;
        pending.retain(|id| id != workspace_id);
        let mut shelf = profile.workspace_member_order;
        if !shelf.iter().any(|id| id == workspace_id) {
            shelf.push(workspace_id.to_string());
        }
        self.apply_profile_patch(
            user_id,
            ProfileUpdate::default()
                .set_workspace_requests(pending)
                .set_workspace_member_order(shelf),
        )?;
        Ok(())
    }

    fn remove_member(&self, workspace_id: &str, user_id: &str) -> eyre::Result<()> {
        let workspace = self.get_workspace_document(workspace_id)?;
        let mut members = workspace.members;
        let before = members.len();
        members.retain(|id| id != user_id);
        if members.len() != before {
            self.apply_workspace_patch(
                workspace_id,
                WorkspaceUpdate::default().set_members(members),
            )?;
        }

        if let Some(profile) = self.profiles().get::<ProfileDocument>(user_id)? {
            let mut shelf = profile.workspace_member_order;
            let before = shelf.len();
            shelf.retain(|id| id != workspace_id);
            if shelf.len() != before {
                self.apply_profile_patch(
                    user_id,
                    ProfileUpdate::default().set_workspace_member_order(shelf),
                )?;
            }
        }
        Ok(())
    }

    // Sign-in refreshes the identity fields but never the shelves.
    fn upsert_profile_document(&self, profile: Profile) -> eyre::Result<()> {
        let document = ProfileDocument::from(profile);
        match self.profiles().get::<ProfileDocument>(&document.id)? {
            Some(_) => {
                let update = ProfileUpdate::default()
                    .set_email(document.email)
                    .set_name(document.name)
                    .set_image_uri(document.image_uri);
                self.apply_profile_patch(&document.id, update)
            }
            None => {
                self.profiles().set(&document)?;
                Ok(())
            }
        }
    }
}

impl StorageConfig for LiveStorageConfig {
    type Storage = LiveStorage;

    fn try_into_storage(self) -> eyre::Result<StorageBox> {
        Ok(StorageBox::new(LiveStorage::try_new(self)?))
    }
}

impl Storage for LiveStorage {
    fn init(&self, config: &plank_config::CoreConfig) -> PinFuture<eyre::Result<()>> {
        let client_name = config.client_name.clone();
        Box::pin(async move {
            for name in [
                WORKSPACES_COLLECTION,
                COLUMNS_COLLECTION,
                CARDS_COLLECTION,
                PROFILES_COLLECTION,
            ] {
                self.connection.collection(name);
            }
            debug!(
                "live storage for client '{client_name}' ready on database '{}'",
                self.config.get_database_name()
            );
            Ok(())
        })
    }

    fn list_columns(&self, workspace_id: WorkspaceId) -> PinFuture<eyre::Result<Vec<Column>>> {
        Box::pin(async move {
            let query =
                Query::filtered(Filter::eq("workspace_id", workspace_id)).order_by("column_index");
            let documents = self.columns().find::<ColumnDocument>(&query)?;
            Ok(documents.into_iter().map(Column::from).collect())
        })
    }

    fn create_column(&self, column: Column) -> PinFuture<eyre::Result<ColumnId>> {
        Box::pin(async move { Ok(self.columns().add(&ColumnDocument::from(column))?) })
    }

    fn update_column(
        &self,
        column_id: ColumnId,
        update: ColumnUpdate,
    ) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.apply_column_patch(&column_id, update) })
    }

    fn delete_column(&self, column_id: ColumnId) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.delete_column_with_cards(&column_id) })
    }

    fn swap_column_positions(
        &self,
        active_id: ColumnId,
        active_index: u32,
        over_id: ColumnId,
        over_index: u32,
    ) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move {
            self.write_column_swap(&active_id, active_index, &over_id, over_index)
        })
    }

    fn sync_column_order(&self, columns: Vec<Column>) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.write_column_order(&columns) })
    }

    fn list_cards(&self, column_id: ColumnId) -> PinFuture<eyre::Result<Vec<Card>>> {
        Box::pin(async move {
            let documents = self.list_card_documents(&column_id)?;
            Ok(documents.into_iter().map(Card::from).collect())
        })
    }

    fn get_card(&self, card_id: CardId) -> PinFuture<eyre::Result<Card>> {
        Box::pin(async move { Ok(Card::from(self.get_card_document(&card_id)?)) })
    }

    fn create_card(&self, card: Card) -> PinFuture<eyre::Result<CardId>> {
        Box::pin(async move { self.create_card_with_membership(card) })
    }

    fn update_card(&self, card_id: CardId, update: CardUpdate) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.apply_card_patch(&card_id, update) })
    }

    fn delete_card(&self, card_id: CardId) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.delete_card_with_membership(&card_id) })
    }

    fn swap_card_positions(
        &self,
        active_id: CardId,
        active_index: u32,
        over_id: CardId,
        over_index: u32,
    ) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.write_card_swap(&active_id, active_index, &over_id, over_index) })
    }

    fn move_card_to_column(
        &self,
        card_id: CardId,
        source_column_id: ColumnId,
        target_column_id: ColumnId,
        target_index: u32,
    ) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move {
            retry::retry(Fixed::from_millis(40).take(2), || {
                match self.move_card_between_columns(
                    &card_id,
                    &source_column_id,
                    &target_column_id,
                    target_index,
                ) {
                    Ok(()) => OperationResult::Ok(()),
                    Err(err)
                        if StorageError::is_not_found(&err)
                            || StorageError::is_partial_commit(&err) =>
                    {
                        OperationResult::Err(err)
                    }
                    Err(err) => OperationResult::Retry(err),
                }
            })
            .map_err(|err| err.error)
        })
    }

    fn sync_card_order(&self, cards: Vec<Card>) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.write_card_order(&cards) })
    }

    fn refresh_column_membership(&self, column_id: ColumnId) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.rebuild_membership(&column_id) })
    }

    fn get_workspace(&self, workspace_id: WorkspaceId) -> PinFuture<eyre::Result<Workspace>> {
        Box::pin(async move { Ok(Workspace::from(self.get_workspace_document(&workspace_id)?)) })
    }

    fn list_workspaces(&self, user_id: UserId) -> PinFuture<eyre::Result<Vec<Workspace>>> {
        Box::pin(async move {
            let owned = self
                .workspaces()
                .find::<WorkspaceDocument>(&Query::filtered(Filter::eq("owner", user_id.clone())))?;
            let joined = self.workspaces().find::<WorkspaceDocument>(&Query::filtered(
                Filter::array_contains("members", user_id),
            ))?;

            let mut seen: BTreeSet<String> = BTreeSet::new();
            let mut workspaces = Vec::new();
            for document in owned.into_iter().chain(joined) {
                if seen.insert(document.id.clone()) {
                    workspaces.push(Workspace::from(document));
                }
            }
            Ok(workspaces)
        })
    }

    fn create_workspace(&self, workspace: Workspace) -> PinFuture<eyre::Result<WorkspaceId>> {
        Box::pin(async move {
            let owner = workspace.owner.clone();
            let workspace_id = self
                .workspaces()
                .add(&WorkspaceDocument::from(workspace))?;
            self.append_owned_workspace(&owner, &workspace_id)?;
            Ok(workspace_id)
        })
    }

    fn update_workspace(
        &self,
        workspace_id: WorkspaceId,
        update: WorkspaceUpdate,
    ) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.apply_workspace_patch(&workspace_id, update) })
    }

    fn delete_workspace(&self, workspace_id: WorkspaceId) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.delete_workspace_with_contents(&workspace_id) })
    }

    fn add_workspace_request(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.add_request(&workspace_id, &user_id) })
    }

    fn remove_workspace_request(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.remove_request(&workspace_id, &user_id) })
    }

    fn accept_workspace_request(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.accept_request(&workspace_id, &user_id) })
    }

    fn remove_workspace_member(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.remove_member(&workspace_id, &user_id) })
    }

    fn get_profile(&self, user_id: UserId) -> PinFuture<eyre::Result<Option<Profile>>> {
        Box::pin(async move {
            let document = self.profiles().get::<ProfileDocument>(&user_id)?;
            Ok(document.map(Profile::from))
        })
    }

    fn upsert_profile(&self, profile: Profile) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.upsert_profile_document(profile) })
    }

    fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> PinFuture<eyre::Result<()>> {
        Box::pin(async move { self.apply_profile_patch(&user_id, update) })
    }

    fn search_profiles(&self, email_prefix: String) -> PinFuture<eyre::Result<Vec<Profile>>> {
        Box::pin(async move {
            let query = Query::filtered(Filter::prefix("email", &email_prefix));
            let documents = self.profiles().find::<ProfileDocument>(&query)?;
            Ok(documents.into_iter().map(Profile::from).collect())
        })
    }

    fn subscribe_columns(
        &self,
        workspace_id: WorkspaceId,
        on_change: ChangeCallback,
    ) -> PinFuture<eyre::Result<SubscriptionGuard>> {
        Box::pin(async move {
            let subscription = self
                .columns()
                .subscribe(Filter::eq("workspace_id", workspace_id), on_change)?;
            Ok(SubscriptionGuard::new(move || subscription.unsubscribe()))
        })
    }

    fn subscribe_cards(
        &self,
        column_id: ColumnId,
        on_change: ChangeCallback,
    ) -> PinFuture<eyre::Result<SubscriptionGuard>> {
        Box::pin(async move {
            let subscription = self
                .cards()
                .subscribe(Filter::eq("column_id", column_id), on_change)?;
            Ok(SubscriptionGuard::new(move || subscription.unsubscribe()))
        })
    }

    fn subscribe_workspace(
        &self,
        workspace_id: WorkspaceId,
        on_change: ChangeCallback,
    ) -> PinFuture<eyre::Result<SubscriptionGuard>> {
        Box::pin(async move {
            let subscription = self
                .workspaces()
                .subscribe(Filter::id(&workspace_id), on_change)?;
            Ok(SubscriptionGuard::new(move || subscription.unsubscribe()))
        })
    }
}
