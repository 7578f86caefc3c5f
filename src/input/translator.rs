//! Input Event Translator
//!
//! Turns the seat's raw pointer callbacks into [`PortableEvent`]s and hands
//! them to the [`EventDispatcher`].
//!
//! # Binding state
//!
//! ```text
//!                 capabilities ∋ Pointer
//!   Uninitialized ───────────────────────> Bound
//!        ^                                   │  enter / leave / motion /
//!        │      capabilities ∌ Pointer       │  button / axis
//!        └───────────────────────────────────┘  (stay Bound)
//! ```
//!
//! # Synthesis
//!
//! | Callback | Effect on state | Event |
//! |----------|-----------------|-------|
//! | motion   | position = (x, y) | `Motion` |
//! | axis     | none | `Wheel` with one [`WHEEL_DELTA`] step, sign inverted |
//! | button   | serial | `ButtonPress` / `ButtonRelease` with the button flag |
//! | enter    | cursor = default, serial | `Enter` |
//! | leave    | serial | `Exit` |
//!
//! Button events carry a single flag, the one for the button that changed.
//! Chords are not tracked: pressing right while left is held produces a
//! press with only the right flag.
//!
//! A cursor the seat refuses on enter is logged and counted; the enter
//! itself still goes through.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::dispatch::EventDispatcher;
use crate::factory::WindowChangeObserver;
use crate::input::backend::{CursorKind, PointerBackend};
use crate::input::callback::{
    DeviceCallback, Fixed, SeatCapabilities, SeatCapability, SurfaceId, AXIS_HORIZONTAL_SCROLL,
    AXIS_VERTICAL_SCROLL, BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, BUTTON_STATE_PRESSED,
};
use crate::input::device::DeviceStateTracker;
use crate::input::error::Result;
use crate::input::event::{EventFlag, EventFlags, Point, PortableEvent, Position, WHEEL_DELTA};
use crate::utils::metrics::{metric_names, MetricsCollector};

/// Map an evdev button code to its event flag
///
/// Codes other than left, right and middle map to no flag.
pub fn button_flags(button: u32) -> Option<EventFlags> {
    match button {
        BTN_LEFT => Some(EventFlag::LeftMouseButton.into()),
        BTN_RIGHT => Some(EventFlag::RightMouseButton.into()),
        BTN_MIDDLE => Some(EventFlag::MiddleMouseButton.into()),
        _ => None,
    }
}

/// Map an axis callback to `(x_offset, y_offset)`
///
/// A positive raw value scrolls one step in the negative direction, any
/// other value one step in the positive direction. Unknown axes yield
/// `None`.
pub fn wheel_offsets(axis: u32, value: Fixed) -> Option<(i32, i32)> {
    let step = if value.raw() > 0 {
        -WHEEL_DELTA
    } else {
        WHEEL_DELTA
    };
    match axis {
        AXIS_HORIZONTAL_SCROLL => Some((step, 0)),
        AXIS_VERTICAL_SCROLL => Some((0, step)),
        _ => None,
    }
}

/// Stateful pointer translator for one seat
pub struct InputTranslator {
    device: DeviceStateTracker,
    backend: Box<dyn PointerBackend>,
    dispatcher: EventDispatcher,
    window_observer: Option<Arc<dyn WindowChangeObserver>>,
    default_cursor: CursorKind,
    metrics: Arc<MetricsCollector>,
    events_processed: u64,
}

impl InputTranslator {
    /// Create a translator delivering through `dispatcher`
    pub fn new(
        backend: Box<dyn PointerBackend>,
        dispatcher: EventDispatcher,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            device: DeviceStateTracker::new(),
            backend,
            dispatcher,
            window_observer: None,
            default_cursor: CursorKind::LeftPtr,
            metrics,
            events_processed: 0,
        }
    }

    /// Cursor shown on bind and on every enter
    pub fn with_default_cursor(mut self, cursor: CursorKind) -> Self {
        self.default_cursor = cursor;
        self
    }

    /// Observer told which surface the pointer is over
    pub fn set_window_change_observer(&mut self, observer: Option<Arc<dyn WindowChangeObserver>>) {
        self.window_observer = observer;
    }

    /// Translate `callback` and dispatch the resulting event, if any
    ///
    /// # Errors
    ///
    /// Propagates backend failures while binding the pointer and dispatch
    /// failures when the UI thread is gone.
    pub fn handle_callback(&mut self, callback: DeviceCallback) -> Result<()> {
        if let Some(event) = self.translate(callback)? {
            self.dispatcher.dispatch(event)?;
        }
        Ok(())
    }

    /// Apply `callback` to the device state and synthesize its event
    ///
    /// Capability changes never produce an event. Pointer callbacks that
    /// arrive while no pointer is bound are dropped.
    pub fn translate(&mut self, callback: DeviceCallback) -> Result<Option<PortableEvent>> {
        self.metrics
            .increment_counter(metric_names::INPUT_CALLBACKS, 1);

        if let DeviceCallback::Capabilities { capabilities } = callback {
            self.on_capabilities(capabilities)?;
            return Ok(None);
        }

        if !self.device.is_bound() {
            debug!(
                callback = callback.name(),
                "Pointer callback without a bound pointer dropped"
            );
            return Ok(None);
        }

        let event = match callback {
            DeviceCallback::Capabilities { .. } => return Ok(None),
            DeviceCallback::Motion { x, y, .. } => self.on_motion(x, y),
            DeviceCallback::Axis { axis, value, .. } => self.on_axis(axis, value),
            DeviceCallback::Button {
                serial,
                button,
                state,
                ..
            } => self.on_button(serial, button, state),
            DeviceCallback::Enter {
                serial, surface, ..
            } => self.on_enter(serial, surface),
            DeviceCallback::Leave { serial, surface } => self.on_leave(serial, surface),
        };

        self.events_processed += 1;
        self.metrics.increment_counter(metric_names::INPUT_EVENTS, 1);
        trace!(?event, "Pointer event synthesized");
        Ok(Some(event))
    }

    fn on_capabilities(&mut self, capabilities: SeatCapabilities) -> Result<()> {
        self.device.ensure_created();

        let has_pointer = capabilities.contains(SeatCapability::Pointer);
        if has_pointer && !self.device.is_bound() {
            let handle = self.backend.acquire_pointer()?;
            self.device.bind(handle, self.default_cursor);
            self.metrics
                .increment_counter(metric_names::INPUT_POINTER_BINDS, 1);
            info!(?handle, "Pointer capability bound");
        } else if !has_pointer {
            if let Some(handle) = self.device.unbind() {
                self.backend.release_pointer(handle);
                info!(?handle, "Pointer capability revoked");
            }
        }
        Ok(())
    }

    fn on_motion(&mut self, x: Fixed, y: Fixed) -> PortableEvent {
        let position = Position::new(x.to_f64(), y.to_f64());
        self.device.set_position(position);
        PortableEvent::Motion {
            location: Point::from_position(position),
        }
    }

    fn on_axis(&mut self, axis: u32, value: Fixed) -> PortableEvent {
        let (x_offset, y_offset) = wheel_offsets(axis, value).unwrap_or_else(|| {
            debug!(axis, "Unknown scroll axis");
            self.metrics
                .increment_counter(metric_names::INPUT_UNKNOWN_CODES, 1);
            (0, 0)
        });

        PortableEvent::Wheel {
            location: self.location(),
            x_offset,
            y_offset,
        }
    }

    fn on_button(&mut self, serial: u32, button: u32, state: u32) -> PortableEvent {
        self.device.record_serial(serial);

        let flags = button_flags(button).unwrap_or_else(|| {
            debug!(button, "Unknown pointer button");
            self.metrics
                .increment_counter(metric_names::INPUT_UNKNOWN_CODES, 1);
            EventFlags::empty()
        });

        let location = self.location();
        if state == BUTTON_STATE_PRESSED {
            PortableEvent::ButtonPress { location, flags }
        } else {
            PortableEvent::ButtonRelease { location, flags }
        }
    }

    fn on_enter(&mut self, serial: u32, surface: SurfaceId) -> PortableEvent {
        // The surface-local enter coordinate is not applied; the event keeps
        // the last known position until the next motion.
        if let Some(handle) = self.device.pointer() {
            if let Err(e) = self.backend.set_cursor(handle, self.default_cursor, serial) {
                warn!(serial, ?handle, "Failed to set cursor on enter: {}", e);
                self.metrics
                    .increment_counter(metric_names::INPUT_CURSOR_FAILURES, 1);
            }
        }
        self.device.set_cursor(self.default_cursor, serial);

        if let Some(observer) = &self.window_observer {
            observer.on_window_enter(surface);
        }

        PortableEvent::Enter {
            location: self.location(),
        }
    }

    fn on_leave(&mut self, serial: u32, surface: SurfaceId) -> PortableEvent {
        self.device.record_serial(serial);

        if let Some(observer) = &self.window_observer {
            observer.on_window_leave(surface);
        }

        PortableEvent::Exit {
            location: self.location(),
        }
    }

    fn location(&self) -> Point {
        Point::from_position(self.device.position())
    }

    /// Device state for inspection
    pub fn device(&self) -> &DeviceStateTracker {
        &self.device
    }

    /// Current pointer position
    pub fn pointer_position(&self) -> Position {
        self.device.position()
    }

    /// Total events synthesized
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }
}

impl std::fmt::Debug for InputTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputTranslator")
            .field("device", &self.device)
            .field("default_cursor", &self.default_cursor)
            .field("events_processed", &self.events_processed)
            .finish()
    }
}
