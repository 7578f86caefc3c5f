//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Thread layout of the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Name of the thread that owns the UI and consumes portable events
    pub ui_thread_name: String,

    /// Name of the thread the channel's send function is bound to
    pub send_thread_name: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            ui_thread_name: "ui".to_string(),
            send_thread_name: "channel-send".to_string(),
        }
    }
}

/// Pointer input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Seat whose pointer is translated
    pub seat_name: String,

    /// Cursor shown on bind and on every surface enter (XCursor name)
    pub default_cursor: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            seat_name: "seat0".to_string(),
            default_cursor: "left_ptr".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Directory for log files (None = console only)
    pub log_dir: Option<PathBuf>,

    /// Log a metrics snapshot at shutdown
    pub metrics: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            metrics: true,
        }
    }
}
