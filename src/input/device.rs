//! Per-Device State
//!
//! What the translator remembers between callbacks: the bound pointer
//! handle, the last position, the cursor currently shown and the last
//! input serial. Events themselves carry everything consumers need, so
//! this is the only state in the input path.

use crate::input::backend::{CursorKind, PointerHandle};
use crate::input::event::Position;

/// Pointer state for one seat
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    /// Bound pointer, `None` while the capability is absent
    pub pointer: Option<PointerHandle>,
    /// Last known position in surface coordinates
    pub position: Position,
    /// Cursor currently displayed
    pub cursor: Option<CursorKind>,
    /// Serial of the most recent enter/leave/button
    pub last_serial: Option<u32>,
}

/// Tracks [`DeviceState`] across capability changes
///
/// The state is created on the first capability advertisement and kept
/// for the life of the tracker. Revoking the capability drops the handle
/// and cursor but keeps the position, so a re-bound pointer starts where
/// the old one stopped.
#[derive(Debug, Default)]
pub struct DeviceStateTracker {
    state: Option<DeviceState>,
}

impl DeviceStateTracker {
    /// Create a tracker with no state yet
    pub fn new() -> Self {
        Self::default()
    }

    /// State, once the seat has advertised capabilities
    pub fn state(&self) -> Option<&DeviceState> {
        self.state.as_ref()
    }

    /// Create the state if this is the first advertisement
    pub fn ensure_created(&mut self) -> &mut DeviceState {
        self.state.get_or_insert_with(DeviceState::default)
    }

    /// Whether a pointer handle is currently bound
    pub fn is_bound(&self) -> bool {
        self.pointer().is_some()
    }

    /// Bound pointer handle
    pub fn pointer(&self) -> Option<PointerHandle> {
        self.state.as_ref().and_then(|s| s.pointer)
    }

    /// Record a newly acquired pointer and its initial cursor
    pub fn bind(&mut self, handle: PointerHandle, cursor: CursorKind) {
        let state = self.ensure_created();
        state.pointer = Some(handle);
        state.cursor = Some(cursor);
    }

    /// Forget the bound pointer, returning it for release
    pub fn unbind(&mut self) -> Option<PointerHandle> {
        let state = self.state.as_mut()?;
        state.cursor = None;
        state.pointer.take()
    }

    /// Last known position; origin before any motion
    pub fn position(&self) -> Position {
        self.state.as_ref().map(|s| s.position).unwrap_or_default()
    }

    /// Move the tracked position
    pub fn set_position(&mut self, position: Position) {
        self.ensure_created().position = position;
    }

    /// Cursor currently displayed
    pub fn cursor(&self) -> Option<CursorKind> {
        self.state.as_ref().and_then(|s| s.cursor)
    }

    /// Record a cursor change made with `serial`
    pub fn set_cursor(&mut self, cursor: CursorKind, serial: u32) {
        let state = self.ensure_created();
        state.cursor = Some(cursor);
        state.last_serial = Some(serial);
    }

    /// Record the serial of an input event
    pub fn record_serial(&mut self, serial: u32) {
        self.ensure_created().last_serial = Some(serial);
    }

    /// Serial of the most recent serial-carrying callback
    pub fn last_serial(&self) -> Option<u32> {
        self.state.as_ref().and_then(|s| s.last_serial)
    }
}
