//! Cross-Thread Delivery
//!
//! One UI-owning thread consumes events; any number of producer threads
//! (device callbacks, the peer-process transport) generate them. Delivery
//! is always an asynchronous post onto the consumer's [`TaskRunner`].
//!
//! ```text
//! device thread ──dispatch()──┐
//!                             ├──> UI TaskRunner queue ──> EventSink
//! other producer ─dispatch()──┘
//! ```
//!
//! Events posted from one producer arrive in posting order. Nothing is
//! promised about the relative order of different producers.

pub mod dispatcher;
pub mod error;
pub mod runner;

pub use dispatcher::{EventDispatcher, EventSink};
pub use error::{DispatchError, Result};
pub use runner::{Task, TaskRunner, ThreadTaskRunner};
