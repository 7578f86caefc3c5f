//! Channel Error Types

use thiserror::Error;

use crate::channel::host::HostId;

/// Result type for channel operations
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Channel module error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// No channel to the peer process is connected
    #[error("No channel to the peer process is connected")]
    NotConnected,

    /// The channel with this id is already established
    #[error("Channel {0} is already established")]
    AlreadyEstablished(HostId),

    /// The context the send capability is bound to has stopped
    #[error("Send context '{0}' is no longer running")]
    TaskRunnerClosed(String),
}
