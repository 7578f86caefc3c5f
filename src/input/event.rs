//! Portable Events
//!
//! The toolkit-neutral representation of pointer input that the translator
//! produces and the UI thread consumes.

use enumflags2::{bitflags, BitFlags};
use serde::{Deserialize, Serialize};

/// Fixed scroll step reported per wheel notch
///
/// Every axis callback maps to exactly one step in one direction; the raw
/// magnitude only decides the sign.
pub const WHEEL_DELTA: i32 = 120;

/// Event flag bits
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventFlag {
    /// Left mouse button involved
    LeftMouseButton = 1 << 4,
    /// Middle mouse button involved
    MiddleMouseButton = 1 << 5,
    /// Right mouse button involved
    RightMouseButton = 1 << 6,
}

/// Set of [`EventFlag`] bits carried by an event
pub type EventFlags = BitFlags<EventFlag>;

/// Integer event location in surface coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl Point {
    /// Create a point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncate a sub-pixel position toward zero
    pub fn from_position(position: Position) -> Self {
        Self {
            x: position.x as i32,
            y: position.y as i32,
        }
    }
}

/// Sub-pixel pointer position as tracked per device
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Position {
    /// Create a position
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Kind of a [`PortableEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Pointer moved
    Motion,
    /// Scroll wheel or axis
    Wheel,
    /// Button pressed
    ButtonPress,
    /// Button released
    ButtonRelease,
    /// Pointer entered a surface
    Enter,
    /// Pointer left a surface
    Exit,
}

/// A synthesized pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortableEvent {
    /// Pointer moved to `location`
    Motion {
        /// Event location
        location: Point,
    },

    /// Scroll by the given offsets at `location`
    Wheel {
        /// Event location
        location: Point,
        /// Horizontal offset, a multiple of [`WHEEL_DELTA`]
        x_offset: i32,
        /// Vertical offset, a multiple of [`WHEEL_DELTA`]
        y_offset: i32,
    },

    /// Button pressed at `location`
    ButtonPress {
        /// Event location
        location: Point,
        /// Which button, empty when the code was not recognized
        flags: EventFlags,
    },

    /// Button released at `location`
    ButtonRelease {
        /// Event location
        location: Point,
        /// Which button, empty when the code was not recognized
        flags: EventFlags,
    },

    /// Pointer entered a surface
    Enter {
        /// Event location
        location: Point,
    },

    /// Pointer left a surface
    Exit {
        /// Event location
        location: Point,
    },
}

impl PortableEvent {
    /// Kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            PortableEvent::Motion { .. } => EventKind::Motion,
            PortableEvent::Wheel { .. } => EventKind::Wheel,
            PortableEvent::ButtonPress { .. } => EventKind::ButtonPress,
            PortableEvent::ButtonRelease { .. } => EventKind::ButtonRelease,
            PortableEvent::Enter { .. } => EventKind::Enter,
            PortableEvent::Exit { .. } => EventKind::Exit,
        }
    }

    /// Location the event happened at
    pub fn location(&self) -> Point {
        match *self {
            PortableEvent::Motion { location }
            | PortableEvent::Wheel { location, .. }
            | PortableEvent::ButtonPress { location, .. }
            | PortableEvent::ButtonRelease { location, .. }
            | PortableEvent::Enter { location }
            | PortableEvent::Exit { location } => location,
        }
    }

    /// Button flags; empty for everything but button events
    pub fn flags(&self) -> EventFlags {
        match *self {
            PortableEvent::ButtonPress { flags, .. } | PortableEvent::ButtonRelease { flags, .. } => {
                flags
            }
            _ => EventFlags::empty(),
        }
    }
}
