//! Dispatch Error Types

use thiserror::Error;

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors raised while posting work to a task runner
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The runner's thread has shut down and no longer accepts tasks
    #[error("Task runner '{0}' is closed")]
    RunnerClosed(String),

    /// The runner thread could not be started
    #[error("Failed to spawn task runner thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    /// The runner thread panicked
    #[error("Task runner '{0}' panicked")]
    ThreadPanic(String),
}
