use plank_storage::storage::live::LiveStorageConfig;
use plank_storage::{BuiltinStorageType, StorageConfig};
use tracing::debug;

use crate::Core;

/// Builds a [`Core`] from a config file. The profile is picked from the
/// explicit name, then the configured default, then `"default"`.
pub fn load(config_path: &str, profile_name: Option<String>) -> eyre::Result<Core> {
    let config = plank_config::load(config_path)?;

    let selected = profile_name
        .or_else(|| config.core.default_profile_name.clone())
        .unwrap_or_else(|| String::from("default"));

    let profile = config
        .profile
        .get(&selected)
        .ok_or_else(|| eyre::eyre!("profile '{selected}' was not found in '{config_path}'"))?;

    let storage_type = BuiltinStorageType::try_from_type_name(&profile.storage_type)?;
    debug!(profile = %selected, storage = %storage_type, "loading core");

    let storage = match storage_type {
        BuiltinStorageType::Live => {
            let storage_config: LiveStorageConfig = profile.details.clone().try_into()?;
            storage_config.try_into_storage()?
        }
    };

    Ok(Core::new(storage, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_builds_a_working_core() {
        let file = write_config(
            r#"
            [core]
            client_name = "laptop"

            [profile.default]
            storage_type = "live"
            volatile = true
        "#,
        );

        let core = load(file.path().to_str().unwrap(), None).unwrap();
        core.initialize().await.unwrap();
    }

    #[test]
    fn test_explicit_profile_wins_over_the_default() {
        let file = write_config(
            r#"
            [core]
            client_name = "laptop"
            default_profile_name = "good"

            [profile.good]
            storage_type = "live"
            volatile = true

            [profile.bad]
            storage_type = "carrier-pigeon"
        "#,
        );
        let path = file.path().to_str().unwrap().to_string();

        assert!(load(&path, None).is_ok());
        assert!(load(&path, Some("bad".to_string())).is_err());
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let file = write_config(
            r#"
            [core]
            client_name = "laptop"

            [profile.default]
            storage_type = "live"
            volatile = true
        "#,
        );

        let err = load(file.path().to_str().unwrap(), Some("ghost".to_string())).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_unknown_storage_type_is_an_error() {
        let file = write_config(
            r#"
            [core]
            client_name = "laptop"

            [profile.default]
            storage_type = "firebase"
        "#,
        );

        let err = load(file.path().to_str().unwrap(), None).unwrap_err();
        assert!(err.to_string().contains("Invalid storage type"));
    }
}
