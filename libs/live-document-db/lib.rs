use serde::de::DeserializeOwned;
use serde::Serialize;

pub use live_document_db_macros as prelude;

pub(crate) mod collection;
pub(crate) mod connection;
pub(crate) mod connection_config;
pub(crate) mod errors;
pub(crate) mod query;
pub(crate) mod subscriber;

pub trait Document: Serialize + DeserializeOwned {
    fn get_document_id(&self) -> String;
    fn set_document_id(&mut self, v: &str);
}

pub use collection::Collection;
pub use connection::Connection;
pub use connection_config::ConnectionConfig;
pub use errors::{StoreError, StoreResult};
pub use query::{Filter, Query};
pub use subscriber::{ChangeCallback, Subscription};
