mod config;
mod load_config;

pub use config::{Config, CoreConfig, DragConfig, ProfileConfig};
pub use load_config::load;
