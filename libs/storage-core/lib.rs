use std::{future::Future, pin::Pin};

mod card;
mod column;
mod error;
mod profile;
mod storage;
mod storage_config;
mod subscription;
mod workspace;

pub use card::{Card, CardBuilder, CardId, CardUpdate, Subtask};
pub use column::{Column, ColumnBuilder, ColumnId, ColumnUpdate};
pub use error::StorageError;
pub use profile::{Profile, ProfileBuilder, ProfileUpdate, UserId};
pub use storage::{Storage, StorageBox};
pub use storage_config::StorageConfig;
pub use subscription::{ChangeCallback, SubscriptionGuard};
pub use workspace::{Workspace, WorkspaceBuilder, WorkspaceId, WorkspaceUpdate};

pub type PinFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
