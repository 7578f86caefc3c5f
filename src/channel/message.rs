//! Channel Messages

use bytes::Bytes;

/// One message exchanged with the peer process
///
/// The framing is owned by the transport; the host only looks at the
/// header to log and count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Routing id of the receiving object on the peer side
    pub routing_id: u32,
    /// Message type within the routing target's protocol
    pub msg_type: u32,
    /// Opaque serialized body
    pub payload: Bytes,
}

impl Message {
    /// Create a message
    pub fn new(routing_id: u32, msg_type: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            routing_id,
            msg_type,
            payload: payload.into(),
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
