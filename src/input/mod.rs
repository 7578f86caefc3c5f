//! Pointer Input Translation
//!
//! Converts a seat's raw pointer callbacks into toolkit-neutral
//! [`PortableEvent`]s.
//!
//! # Architecture
//!
//! ```text
//! seat callbacks (DeviceCallback)
//!       ↓
//! ┌─────────────────────────┐     ┌────────────────────┐
//! │  InputTranslator        │ ──> │  PointerBackend    │ acquire / release /
//! │  - binding state        │     │  (protocol seam)   │ set_cursor
//! │  - event synthesis      │     └────────────────────┘
//! └─────────────────────────┘
//!       ↓            ↑
//!       ↓     DeviceStateTracker (position, cursor, serial)
//!       ↓
//! EventDispatcher ──> UI thread ──> EventSink
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ozone_bridge::dispatch::{EventDispatcher, EventSink, ThreadTaskRunner};
//! use ozone_bridge::input::{DeviceCallback, HeadlessPointerBackend, InputTranslator, PortableEvent, SeatCapability};
//! use ozone_bridge::utils::MetricsCollector;
//!
//! struct Print;
//! impl EventSink for Print {
//!     fn dispatch_event(&self, event: PortableEvent) {
//!         println!("{:?}", event);
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ui = ThreadTaskRunner::spawn("ui")?;
//! let metrics = Arc::new(MetricsCollector::new());
//! let dispatcher = EventDispatcher::new(ui, Arc::new(Print), metrics.clone());
//! let mut translator =
//!     InputTranslator::new(Box::new(HeadlessPointerBackend::new()), dispatcher, metrics);
//!
//! translator.handle_callback(DeviceCallback::Capabilities {
//!     capabilities: SeatCapability::Pointer.into(),
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod callback;
pub mod device;
pub mod error;
pub mod event;
pub mod translator;

pub use backend::{CursorKind, HeadlessPointerBackend, PointerBackend, PointerHandle};
pub use callback::{DeviceCallback, Fixed, SeatCapabilities, SeatCapability, SurfaceId};
pub use device::{DeviceState, DeviceStateTracker};
pub use error::{InputError, Result};
pub use event::{EventFlag, EventFlags, EventKind, Point, PortableEvent, Position, WHEEL_DELTA};
pub use translator::{button_flags, wheel_offsets, InputTranslator};
