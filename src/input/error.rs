//! Input Handling Error Types

use thiserror::Error;

use crate::dispatch::DispatchError;

/// Result type for input operations
pub type Result<T> = std::result::Result<T, InputError>;

/// Input module error types
#[derive(Error, Debug)]
pub enum InputError {
    /// The pointer device is not available to the backend
    #[error("Pointer device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The device backend refused an operation
    #[error("Pointer backend error: {0}")]
    BackendFailed(String),

    /// Cursor name not known to the bridge
    #[error("Unknown cursor: {0}")]
    UnknownCursor(String),

    /// A synthesized event could not be handed to the UI thread
    #[error("Event dispatch failed: {0}")]
    DispatchFailed(#[from] DispatchError),
}
