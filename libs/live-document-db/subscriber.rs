use crate::connection::DatabaseInner;
use crate::query::Filter;
use serde_json::Value as JsonValue;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use tracing::error;

/// Callbacks carry no payload: a notified subscriber is expected to
/// re-fetch whatever it is interested in.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync + 'static>;

pub(crate) struct Watcher {
    pub(crate) collection: String,
    pub(crate) filter: Filter,
    pub(crate) callback: ChangeCallback,
}

/// Keeps a change watcher registered. Notifications stop when the handle
/// is dropped or explicitly unsubscribed.
pub struct Subscription {
    pub(crate) database: Weak<DatabaseInner>,
    pub(crate) id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(database) = self.database.upgrade() {
            database.watchers.remove(&self.id);
        }
    }
}

impl DatabaseInner {
    pub(crate) fn register_watcher(
        &self,
        collection: &str,
        filter: Filter,
        callback: ChangeCallback,
    ) -> u64 {
        let id = self.watcher_seq.fetch_add(1, Ordering::SeqCst);
        self.watchers.insert(
            id,
            Watcher {
                collection: collection.to_string(),
                filter,
                callback,
            },
        );
        id
    }

    /// Notifies every watcher whose filter matches the old or the new body
    /// of the mutated document. Writers notify themselves too. Callbacks
    /// are collected before being invoked so a callback may freely touch
    /// the store, and a panicking callback is isolated.
    pub(crate) fn notify_change(
        &self,
        collection: &str,
        document_id: &str,
        old: Option<&JsonValue>,
        new: Option<&JsonValue>,
    ) {
        let mut matched: Vec<ChangeCallback> = Vec::new();
        for entry in self.watchers.iter() {
            let watcher = entry.value();
            if watcher.collection != collection {
                continue;
            }
            let touched = old
                .map(|body| watcher.filter.matches(document_id, body))
                .unwrap_or(false)
                || new
                    .map(|body| watcher.filter.matches(document_id, body))
                    .unwrap_or(false);
            if touched {
                matched.push(watcher.callback.clone());
            }
        }

        for callback in matched {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                error!("change callback panicked for collection '{collection}'");
            }
        }
    }
}
