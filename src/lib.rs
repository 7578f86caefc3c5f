//! # ozone-bridge
//!
//! Host-side platform bridge between a privileged host process and an
//! isolated rendering process, plus translation of a Wayland seat's pointer
//! input into toolkit-neutral events.
//!
//! # Architecture
//!
//! ```text
//! ozone-bridge
//!   ├─> ChannelSupportHost (one channel to the peer, handler/observer fan-out)
//!   ├─> InputTranslator    (seat callbacks → PortableEvent)
//!   ├─> EventDispatcher    (ordered delivery onto the UI thread)
//!   └─> EventFactory       (process-wide access point for the input side)
//! ```
//!
//! # Data Flow
//!
//! **Input Path:** Seat → InputTranslator → EventDispatcher → UI thread → EventSink
//!
//! **Channel Path:** Transport → ChannelSupportHost → Handlers / Observers
//!
//! **Send Path:** Handler → ChannelSender → bound send thread → Transport

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Peer-process channel lifecycle and message routing
pub mod channel;

/// Bridge configuration
pub mod config;

/// Task runners and UI-thread event delivery
pub mod dispatch;

/// Process-wide access point for the input side
pub mod factory;

/// Pointer input translation
pub mod input;

/// Recorded session traces
pub mod trace;

/// Utility functions
pub mod utils;
