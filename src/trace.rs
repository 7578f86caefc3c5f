//! Session Traces
//!
//! A recorded bridge session as JSON lines, one [`TraceRecord`] per line.
//! Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"record":"channel_established","host_id":1}
//! {"record":"device","callback":{"type":"capabilities","capabilities":1}}
//! {"record":"device","callback":{"type":"motion","time":10,"x":15.0,"y":20.0}}
//! {"record":"message","routing_id":0,"msg_type":4,"payload":"ping"}
//! {"record":"send","routing_id":0,"msg_type":5}
//! {"record":"channel_destroyed","host_id":1}
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::{HostId, Message};
use crate::input::DeviceCallback;

/// Result type for trace reading
pub type Result<T> = std::result::Result<T, TraceError>;

/// Trace reading errors
#[derive(Error, Debug)]
pub enum TraceError {
    /// The trace could not be read
    #[error("Failed to read trace: {0}")]
    Io(#[from] io::Error),

    /// A line is not a valid record
    #[error("Invalid trace record on line {line}: {source}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// Underlying JSON error
        source: serde_json::Error,
    },
}

/// One recorded occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum TraceRecord {
    /// Transport reported a new channel
    ChannelEstablished {
        /// Transport-assigned id
        host_id: i32,
    },

    /// Transport reported a channel gone
    ChannelDestroyed {
        /// Transport-assigned id
        host_id: i32,
    },

    /// Inbound message from the peer process
    Message {
        /// Routing id
        routing_id: u32,
        /// Message type
        msg_type: u32,
        /// Body as text
        #[serde(default)]
        payload: String,
    },

    /// Outbound message a subsystem sent
    Send {
        /// Routing id
        routing_id: u32,
        /// Message type
        msg_type: u32,
        /// Body as text
        #[serde(default)]
        payload: String,
    },

    /// Raw seat callback
    Device {
        /// The callback
        callback: DeviceCallback,
    },
}

impl TraceRecord {
    /// Channel id for establish and destroy records
    pub fn host_id(&self) -> Option<HostId> {
        match self {
            TraceRecord::ChannelEstablished { host_id }
            | TraceRecord::ChannelDestroyed { host_id } => Some(HostId(*host_id)),
            _ => None,
        }
    }

    /// Channel message for message and send records
    pub fn message(&self) -> Option<Message> {
        match self {
            TraceRecord::Message {
                routing_id,
                msg_type,
                payload,
            }
            | TraceRecord::Send {
                routing_id,
                msg_type,
                payload,
            } => Some(Message::new(
                *routing_id,
                *msg_type,
                payload.clone().into_bytes(),
            )),
            _ => None,
        }
    }
}

/// Parse every record in `reader`
///
/// # Errors
///
/// Stops at the first unreadable or malformed line.
pub fn read_trace(reader: impl BufRead) -> Result<Vec<TraceRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(trimmed).map_err(|source| TraceError::Parse {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Parse the trace file at `path`
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<TraceRecord>> {
    let file = File::open(path)?;
    read_trace(BufReader::new(file))
}
