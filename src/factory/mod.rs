//! Event Factory
//!
//! Process-wide access point for the input side of the bridge: the event
//! dispatcher synthesized events go through, and the observers interested
//! in window, IME and output changes.
//!
//! Components should receive an [`EventFactory`] (or the pieces of it they
//! need) when they are constructed. The global accessor exists only for
//! callers that cannot be handed one; it accepts exactly one installation
//! per process and treats a second one as a wiring bug.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ozone_bridge::factory::EventFactory;
//!
//! let factory = EventFactory::install(Arc::new(EventFactory::new()));
//! assert!(Arc::ptr_eq(&factory, &EventFactory::instance()));
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::info;

use crate::dispatch::EventDispatcher;
use crate::input::callback::SurfaceId;

static INSTANCE: OnceLock<Arc<EventFactory>> = OnceLock::new();

/// Told when the pointer or focus moves between surfaces
pub trait WindowChangeObserver: Send + Sync {
    /// Pointer entered `surface`
    fn on_window_enter(&self, surface: SurfaceId);

    /// Pointer left `surface`
    fn on_window_leave(&self, surface: SurfaceId);

    /// Keyboard focus moved to `surface`
    fn on_window_focused(&self, _surface: SurfaceId) {}
}

/// Told about input-method composition
pub trait ImeChangeObserver: Send + Sync {
    /// Composition text changed; `commit` is what a commit would insert
    fn on_preedit_changed(&self, text: &str, commit: &str);

    /// Text committed by the input method
    fn on_commit(&self, text: &str);
}

/// Told when an output changes size
pub trait OutputChangeObserver: Send + Sync {
    /// Output is now `width` x `height` pixels
    fn on_output_size_changed(&self, width: u32, height: u32);
}

/// Holder of the input-side collaborators
#[derive(Default)]
pub struct EventFactory {
    dispatcher: RwLock<Option<EventDispatcher>>,
    window_observer: RwLock<Option<Arc<dyn WindowChangeObserver>>>,
    ime_observer: RwLock<Option<Arc<dyn ImeChangeObserver>>>,
    output_observer: RwLock<Option<Arc<dyn OutputChangeObserver>>>,
}

impl EventFactory {
    /// Create a factory with every slot empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `factory` the process-wide instance
    ///
    /// # Panics
    ///
    /// Panics if an instance is already installed.
    pub fn install(factory: Arc<EventFactory>) -> Arc<EventFactory> {
        if INSTANCE.set(Arc::clone(&factory)).is_err() {
            panic!("Replacing installed EventFactory implementation");
        }
        info!("EventFactory installed");
        factory
    }

    /// The process-wide instance
    ///
    /// # Panics
    ///
    /// Panics if [`install`](Self::install) has not been called.
    pub fn instance() -> Arc<EventFactory> {
        match INSTANCE.get() {
            Some(factory) => Arc::clone(factory),
            None => panic!("No EventFactory implementation installed"),
        }
    }

    /// The process-wide instance, if one is installed
    pub fn try_instance() -> Option<Arc<EventFactory>> {
        INSTANCE.get().cloned()
    }

    /// Set the dispatcher synthesized events are delivered through
    pub fn set_event_dispatcher(&self, dispatcher: EventDispatcher) {
        *self.dispatcher.write() = Some(dispatcher);
    }

    /// Dispatcher synthesized events are delivered through
    pub fn event_dispatcher(&self) -> Option<EventDispatcher> {
        self.dispatcher.read().clone()
    }

    /// Replace the window-change observer
    pub fn set_window_change_observer(&self, observer: Option<Arc<dyn WindowChangeObserver>>) {
        *self.window_observer.write() = observer;
    }

    /// Current window-change observer
    pub fn window_change_observer(&self) -> Option<Arc<dyn WindowChangeObserver>> {
        self.window_observer.read().clone()
    }

    /// Replace the IME-change observer
    pub fn set_ime_change_observer(&self, observer: Option<Arc<dyn ImeChangeObserver>>) {
        *self.ime_observer.write() = observer;
    }

    /// Current IME-change observer
    pub fn ime_change_observer(&self) -> Option<Arc<dyn ImeChangeObserver>> {
        self.ime_observer.read().clone()
    }

    /// Replace the output-change observer
    pub fn set_output_change_observer(&self, observer: Option<Arc<dyn OutputChangeObserver>>) {
        *self.output_observer.write() = observer;
    }

    /// Current output-change observer
    pub fn output_change_observer(&self) -> Option<Arc<dyn OutputChangeObserver>> {
        self.output_observer.read().clone()
    }
}

impl fmt::Debug for EventFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFactory")
            .field("dispatcher", &self.dispatcher.read().is_some())
            .field("window_observer", &self.window_observer.read().is_some())
            .field("ime_observer", &self.ime_observer.read().is_some())
            .field("output_observer", &self.output_observer.read().is_some())
            .finish()
    }
}
