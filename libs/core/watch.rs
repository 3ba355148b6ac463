use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use plank_storage::{ChangeCallback, Column, ColumnId, StorageBox, SubscriptionGuard};

/// Collapses every store notification for one board into a single staleness
/// flag. Callbacks only set the flag; the engine decides when a refetch is
/// safe (never mid-drag) and clears it before fetching.
#[derive(Debug)]
pub struct BoardWatcher {
    stale: Arc<AtomicBool>,
    workspace_guard: SubscriptionGuard,
    columns_guard: SubscriptionGuard,
    card_guards: DashMap<ColumnId, SubscriptionGuard>,
}

impl BoardWatcher {
    /// Subscribes to the workspace document and its column set. Card
    /// subscriptions are attached per column through
    /// [`sync_card_subscriptions`](Self::sync_card_subscriptions).
    pub async fn attach(storage: &StorageBox, workspace_id: &str) -> eyre::Result<Self> {
        let stale = Arc::new(AtomicBool::new(false));
        let workspace_guard = storage
            .subscribe_workspace(workspace_id.to_string(), change_callback(&stale))
            .await?;
        let columns_guard = storage
            .subscribe_columns(workspace_id.to_string(), change_callback(&stale))
            .await?;

        Ok(Self {
            stale,
            workspace_guard,
            columns_guard,
            card_guards: DashMap::new(),
        })
    }

    /// Aligns the per-column card subscriptions with the given column set,
    /// subscribing new columns and dropping watchers for removed ones.
    pub async fn sync_card_subscriptions(
        &self,
        storage: &StorageBox,
        columns: &[Column],
    ) -> eyre::Result<()> {
        let live: BTreeSet<&str> = columns.iter().map(|column| column.id.as_str()).collect();
        self.card_guards
            .retain(|column_id, _| live.contains(column_id.as_str()));

        for column in columns {
            if self.card_guards.contains_key(&column.id) {
                continue;
            }
            let guard = storage
                .subscribe_cards(column.id.clone(), change_callback(&self.stale))
                .await?;
            self.card_guards.insert(column.id.clone(), guard);
        }

        Ok(())
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    pub fn mark_fresh(&self) {
        self.stale.store(false, Ordering::SeqCst);
    }
}

fn change_callback(stale: &Arc<AtomicBool>) -> ChangeCallback {
    let stale = stale.clone();
    Box::new(move || {
        stale.store(true, Ordering::SeqCst);
    })
}
