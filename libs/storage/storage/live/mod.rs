mod config;
mod documents;
mod storage;

pub use config::LiveStorageConfig;
pub use storage::LiveStorage;
