pub mod handle;
pub mod manager;
pub mod progress;
pub mod types;

pub use handle::TaskHandle;
pub use manager::TaskManager;
pub use progress::{
    ProgressCallback,
    ProgressReporter,
    RecalcProgress,
    CHECKPOINT_INTERVAL,
};
pub use types::TaskResult;
