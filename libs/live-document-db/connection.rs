use crate::collection::Collection;
use crate::connection_config::ConnectionConfig;
use crate::errors::StoreResult;
use crate::subscriber::Watcher;
use dashmap::DashMap;
use lazy_static::lazy_static;
use serde_json::Value as JsonValue;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

lazy_static! {
    static ref DATABASE_REGISTRY: DashMap<String, Arc<DatabaseInner>> = DashMap::new();
}

pub(crate) struct DatabaseInner {
    pub(crate) name: String,
    pub(crate) collections: DashMap<String, Arc<DashMap<String, JsonValue>>>,
    pub(crate) watchers: DashMap<u64, Watcher>,
    pub(crate) watcher_seq: AtomicU64,
}

impl DatabaseInner {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            collections: DashMap::new(),
            watchers: DashMap::new(),
            watcher_seq: AtomicU64::new(0),
        }
    }
}

/// Handle on a named in-process database. Every connection initialized with
/// the same database name shares one store, which is how several clients
/// end up observing each other's writes and notifications.
#[derive(Clone)]
pub struct Connection {
    pub(crate) database: Arc<DatabaseInner>,
}

impl Connection {
    pub fn initialize(config: ConnectionConfig) -> StoreResult<Connection> {
        let database = if config.volatile {
            Arc::new(DatabaseInner::new(&config.database_name))
        } else {
            DATABASE_REGISTRY
                .entry(config.database_name.clone())
                .or_insert_with(|| Arc::new(DatabaseInner::new(&config.database_name)))
                .value()
                .clone()
        };

        Ok(Self { database })
    }

    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(self, name)
    }

    pub fn database_name(&self) -> &str {
        &self.database.name
    }
}
