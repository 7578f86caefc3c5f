//! Pointer Device Backend
//!
//! The seam to the display-protocol bindings: acquiring and releasing the
//! pointer object of a seat and changing the cursor image shown for it.
//! Everything behind this trait (listener registration, shm cursor
//! buffers) is opaque to the translator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::input::error::{InputError, Result};

/// Opaque handle to an acquired pointer device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerHandle(pub u32);

/// Cursor images the bridge can request, by XCursor name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorKind {
    /// Default arrow
    #[default]
    LeftPtr,
    /// Pointing hand over links
    Hand2,
    /// Text insertion beam
    Xterm,
    /// Busy indicator
    Watch,
    /// Move grip
    Fleur,
}

impl CursorKind {
    /// XCursor theme name of this glyph
    pub fn name(self) -> &'static str {
        match self {
            CursorKind::LeftPtr => "left_ptr",
            CursorKind::Hand2 => "hand2",
            CursorKind::Xterm => "xterm",
            CursorKind::Watch => "watch",
            CursorKind::Fleur => "fleur",
        }
    }
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CursorKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left_ptr" => Ok(CursorKind::LeftPtr),
            "hand2" => Ok(CursorKind::Hand2),
            "xterm" => Ok(CursorKind::Xterm),
            "watch" => Ok(CursorKind::Watch),
            "fleur" => Ok(CursorKind::Fleur),
            other => Err(InputError::UnknownCursor(other.to_string())),
        }
    }
}

/// Device collaborator that owns the protocol objects for a seat's pointer
#[cfg_attr(test, mockall::automock)]
pub trait PointerBackend: Send {
    /// Obtain the seat's pointer object and start receiving its callbacks
    fn acquire_pointer(&mut self) -> Result<PointerHandle>;

    /// Destroy a pointer object obtained from [`acquire_pointer`](Self::acquire_pointer)
    fn release_pointer(&mut self, handle: PointerHandle);

    /// Show `cursor` for `handle`, tied to the input `serial` that allowed it
    fn set_cursor(&mut self, handle: PointerHandle, cursor: CursorKind, serial: u32) -> Result<()>;
}

/// Backend without a display connection
///
/// Hands out sequential handles and remembers the cursor it was asked to
/// show. Used when replaying recorded sessions.
#[derive(Debug, Default)]
pub struct HeadlessPointerBackend {
    next_handle: u32,
    active: Option<PointerHandle>,
    cursor: Option<(CursorKind, u32)>,
}

impl HeadlessPointerBackend {
    /// Create a backend with no pointer acquired
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently acquired pointer, if any
    pub fn active_pointer(&self) -> Option<PointerHandle> {
        self.active
    }

    /// Last cursor set and the serial it was set with
    pub fn cursor(&self) -> Option<(CursorKind, u32)> {
        self.cursor
    }
}

impl PointerBackend for HeadlessPointerBackend {
    fn acquire_pointer(&mut self) -> Result<PointerHandle> {
        if let Some(handle) = self.active {
            return Err(InputError::BackendFailed(format!(
                "pointer {:?} already acquired",
                handle
            )));
        }
        self.next_handle += 1;
        let handle = PointerHandle(self.next_handle);
        self.active = Some(handle);
        debug!(?handle, "Headless pointer acquired");
        Ok(handle)
    }

    fn release_pointer(&mut self, handle: PointerHandle) {
        if self.active == Some(handle) {
            self.active = None;
            self.cursor = None;
            debug!(?handle, "Headless pointer released");
        }
    }

    fn set_cursor(&mut self, handle: PointerHandle, cursor: CursorKind, serial: u32) -> Result<()> {
        if self.active != Some(handle) {
            return Err(InputError::DeviceUnavailable(format!(
                "pointer {:?} is not acquired",
                handle
            )));
        }
        self.cursor = Some((cursor, serial));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_names_round_trip() {
        for kind in [
            CursorKind::LeftPtr,
            CursorKind::Hand2,
            CursorKind::Xterm,
            CursorKind::Watch,
            CursorKind::Fleur,
        ] {
            assert_eq!(kind.name().parse::<CursorKind>().unwrap(), kind);
        }
        assert!("pirate".parse::<CursorKind>().is_err());
    }

    #[test]
    fn test_headless_backend_single_acquire() {
        let mut backend = HeadlessPointerBackend::new();
        let handle = backend.acquire_pointer().unwrap();
        assert!(backend.acquire_pointer().is_err());

        backend.release_pointer(handle);
        assert!(backend.active_pointer().is_none());

        let second = backend.acquire_pointer().unwrap();
        assert_ne!(handle, second);
    }

    #[test]
    fn test_headless_backend_cursor_requires_pointer() {
        let mut backend = HeadlessPointerBackend::new();
        assert!(backend
            .set_cursor(PointerHandle(9), CursorKind::LeftPtr, 1)
            .is_err());

        let handle = backend.acquire_pointer().unwrap();
        backend.set_cursor(handle, CursorKind::Hand2, 42).unwrap();
        assert_eq!(backend.cursor(), Some((CursorKind::Hand2, 42)));
    }
}
