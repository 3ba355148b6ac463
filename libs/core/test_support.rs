use std::collections::HashMap;

use plank_config::{Config, CoreConfig, DragConfig};
use plank_storage::storage::live::LiveStorageConfig;
use plank_storage::StorageConfig;

use crate::Core;

pub(crate) fn test_config() -> Config {
    Config {
        core: CoreConfig {
            client_name: "tests".to_string(),
            default_profile_name: None,
        },
        drag: DragConfig::default(),
        profile: HashMap::new(),
    }
}

/// A core over a private volatile store, or over a shared named one when a
/// database name is given (two cores with the same name see each other's
/// writes).
pub(crate) async fn build_core_with(database: Option<String>) -> Core {
    let volatile = if database.is_some() { None } else { Some(true) };
    let storage = LiveStorageConfig { database, volatile }
        .try_into_storage()
        .unwrap();
    let core = Core::new(storage, test_config());
    core.initialize().await.unwrap();
    core
}

pub(crate) async fn build_test_core() -> Core {
    build_core_with(None).await
}

pub(crate) async fn seed_user(core: &Core, user_id: &str) {
    core.ensure_profile(user_id, &format!("{user_id}@plank.dev"), user_id, "")
        .await
        .unwrap();
}
