//! Raw Device Callbacks
//!
//! The closed set of pointer notifications a seat delivers, as one enum
//! matched exhaustively by the translator. Field layout follows the
//! `wl_seat` / `wl_pointer` events: coordinates and axis values arrive in
//! 24.8 fixed point, buttons as evdev codes.

use enumflags2::{bitflags, BitFlags};
use serde::{Deserialize, Serialize};

/// evdev code of the left mouse button
pub const BTN_LEFT: u32 = 0x110;
/// evdev code of the right mouse button
pub const BTN_RIGHT: u32 = 0x111;
/// evdev code of the middle mouse button
pub const BTN_MIDDLE: u32 = 0x112;

/// `wl_pointer.button_state.released`
pub const BUTTON_STATE_RELEASED: u32 = 0;
/// `wl_pointer.button_state.pressed`
pub const BUTTON_STATE_PRESSED: u32 = 1;

/// `wl_pointer.axis.vertical_scroll`
pub const AXIS_VERTICAL_SCROLL: u32 = 0;
/// `wl_pointer.axis.horizontal_scroll`
pub const AXIS_HORIZONTAL_SCROLL: u32 = 1;

/// Seat capability bits (`wl_seat.capability`)
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatCapability {
    /// The seat has pointer devices
    Pointer = 1,
    /// The seat has keyboards
    Keyboard = 2,
    /// The seat has touch devices
    Touch = 4,
}

/// Capability bitmask advertised by a seat, serialized as its raw bits
pub type SeatCapabilities = BitFlags<SeatCapability>;

/// Signed 24.8 fixed-point number (`wl_fixed_t`)
///
/// Serialized as a plain float so traces stay readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Fixed(i32);

impl Fixed {
    /// Fixed-point zero
    pub const ZERO: Fixed = Fixed(0);

    /// Wrap a raw wire value
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw wire value
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Nearest fixed-point value to `value`
    pub fn from_f64(value: f64) -> Self {
        Self((value * 256.0).round() as i32)
    }

    /// Convert to floating point
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 256.0
    }
}

impl From<f64> for Fixed {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<Fixed> for f64 {
    fn from(value: Fixed) -> Self {
        value.to_f64()
    }
}

/// Identifier of the surface a pointer entered or left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

/// One raw notification from the seat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceCallback {
    /// The seat's capability set changed
    Capabilities {
        /// Capabilities now present
        capabilities: SeatCapabilities,
    },

    /// Pointer entered `surface`
    Enter {
        /// Input serial of the enter
        serial: u32,
        /// Surface entered
        surface: SurfaceId,
        /// Surface-local X
        x: Fixed,
        /// Surface-local Y
        y: Fixed,
    },

    /// Pointer left `surface`
    Leave {
        /// Input serial of the leave
        serial: u32,
        /// Surface left
        surface: SurfaceId,
    },

    /// Pointer moved
    Motion {
        /// Timestamp in milliseconds
        time: u32,
        /// Surface-local X
        x: Fixed,
        /// Surface-local Y
        y: Fixed,
    },

    /// A button changed state
    Button {
        /// Input serial of the button event
        serial: u32,
        /// Timestamp in milliseconds
        time: u32,
        /// evdev button code
        button: u32,
        /// `BUTTON_STATE_PRESSED` or `BUTTON_STATE_RELEASED`
        state: u32,
    },

    /// Scroll on one axis
    Axis {
        /// Timestamp in milliseconds
        time: u32,
        /// `AXIS_VERTICAL_SCROLL` or `AXIS_HORIZONTAL_SCROLL`
        axis: u32,
        /// Signed scroll magnitude
        value: Fixed,
    },
}

impl DeviceCallback {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            DeviceCallback::Capabilities { .. } => "capabilities",
            DeviceCallback::Enter { .. } => "enter",
            DeviceCallback::Leave { .. } => "leave",
            DeviceCallback::Motion { .. } => "motion",
            DeviceCallback::Button { .. } => "button",
            DeviceCallback::Axis { .. } => "axis",
        }
    }
}
