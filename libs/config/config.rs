use std::collections::HashMap;

use serde_derive::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    /// Name identifying this client in logs
    pub client_name: String,

    /// Profile used by default when none are specified
    pub default_profile_name: Option<String>,
}

/// Drag gesture tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct DragConfig {
    /// Pointer travel (in logical pixels) required before a press becomes
    /// a drag instead of a click.
    #[serde(default = "default_activation_distance")]
    pub activation_distance: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            activation_distance: default_activation_distance(),
        }
    }
}

fn default_activation_distance() -> f64 {
    30.0
}

#[derive(Debug, Deserialize)]
pub struct ProfileConfig {
    /// Type of storage (e.g. live)
    pub storage_type: String,

    // Rest of the storage config as a flexible structure
    #[serde(flatten)]
    pub details: toml::Value,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub core: CoreConfig,
    #[serde(default)]
    pub drag: DragConfig,
    pub profile: HashMap<String, ProfileConfig>,
}
