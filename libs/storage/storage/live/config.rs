use serde::Serialize;
use serde_derive::Deserialize;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct LiveStorageConfig {
    /// Name of the shared in-process database (default to: plank)
    pub database: Option<String>,

    /// Volatile databases are private to their connection and vanish with
    /// it; mostly useful for tests
    pub volatile: Option<bool>,
}

impl LiveStorageConfig {
    pub fn get_database_name(&self) -> String {
        self.database
            .clone()
            .unwrap_or_else(|| String::from("plank"))
    }

    pub fn get_volatile(&self) -> bool {
        self.volatile.unwrap_or(false)
    }
}
