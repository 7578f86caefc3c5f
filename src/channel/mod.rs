//! Peer-Process Channel Multiplexing
//!
//! [`ChannelSupportHost`] tracks the one channel between this process and
//! the isolated peer process and fans its lifecycle out to the subsystems
//! that use it.
//!
//! # Architecture
//!
//! ```text
//!  transport                     ChannelSupportHost                 subsystems
//! ━━━━━━━━━━━                    ━━━━━━━━━━━━━━━━━━                 ━━━━━━━━━━
//!
//!  establish(id, ctx, send) ───> channel: Option<ActiveChannel> ──> handlers
//!  destroy(id)              ───>   (stale ids ignored)          ──> observers
//!  deliver(message)         ───> first handler that claims it
//!
//!  send_fn  <── posted to ctx <── ChannelSender <───────────────── handlers
//! ```
//!
//! Handlers and observers are held weakly. The send capability is only
//! ever invoked on the context it was established with.

pub mod error;
pub mod host;
pub mod message;
pub mod registry;
pub mod sender;

pub use error::{ChannelError, Result};
pub use host::{ChannelHandler, ChannelObserver, ChannelSupportHost, HostId};
pub use message::Message;
pub use registry::ListenerSet;
pub use sender::{ChannelSender, Delivery, SendFn};
