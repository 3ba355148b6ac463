use std::fmt;

use plank_config::Config;
use plank_storage::StorageBox;

pub mod board;
mod boards;
pub mod drag;
mod error;
mod load;
pub mod tracing;
mod utils;
pub mod watch;
mod workspaces;

#[cfg(test)]
pub(crate) mod test_support;

pub use board::{BoardFilter, BoardState, DragTarget};
pub use boards::{new_subtask, OpenBoard};
pub use drag::{DragKind, DragOrigin, DragSession, DragTuning, DropOutcome};
pub use error::CoreError;
pub use load::load;
pub use utils::{classify_due_date, format_due_date, today, tomorrow, unix_now, DueLabel};
pub use watch::BoardWatcher;
pub use workspaces::{ShelfKind, WorkspaceShelves};

/// The engine handle: one storage backend plus the loaded configuration.
/// Boards are opened from here and every remote operation goes through it.
pub struct Core {
    storage: StorageBox,
    config: Config,
}

impl Core {
    pub fn new(storage: StorageBox, config: Config) -> Self {
        Self { storage, config }
    }

    /// Warms up the backend. Call once before the first operation.
    pub async fn initialize(&self) -> eyre::Result<()> {
        self.storage.init(&self.config.core).await
    }

    pub fn drag_tuning(&self) -> DragTuning {
        DragTuning::from(&self.config.drag)
    }

    pub fn get_inner_storage(&self) -> &StorageBox {
        &self.storage
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
