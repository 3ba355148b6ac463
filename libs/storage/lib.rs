use std::str::FromStr;
use strum_macros::{Display, EnumString};

pub use plank_storage_core::{
    Card, CardId, CardUpdate, ChangeCallback, Column, ColumnId, ColumnUpdate, PinFuture, Profile,
    ProfileUpdate, Storage, StorageBox, StorageConfig, StorageError, SubscriptionGuard, Subtask,
    UserId, Workspace, WorkspaceId, WorkspaceUpdate,
};

pub mod storage {
    pub mod live;
}

#[derive(Clone, Debug, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum BuiltinStorageType {
    Live,
}

impl BuiltinStorageType {
    pub fn try_from_type_name(s: &str) -> eyre::Result<Self> {
        Self::from_str(s)
            .map_err(|_| eyre::eyre!("Invalid storage type specified, please select `live`"))
    }
}
