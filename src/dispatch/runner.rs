//! Task Runners
//!
//! A task runner is an execution context identified by the thread it runs
//! on. Work is handed to it by posting a boxed closure; posting never waits
//! for the task to run.
//!
//! # Architecture
//!
//! ```text
//! Producer threads                    Runner thread (std::thread)
//! ━━━━━━━━━━━━━━━━                    ━━━━━━━━━━━━━━━━━━━━━━━━━━
//!
//! post_task(A) ──┐
//! post_task(B) ──┼──> crossbeam queue ──> run_task_loop()
//! post_task(C) ──┘     (unbounded)          ├─ Run(A)
//!                                           ├─ Run(B)
//!                                           ├─ Run(C)
//!                                           └─ Shutdown → exit
//! ```
//!
//! The queue is a single FIFO, so tasks posted from one producer thread run
//! in the order they were posted. Tasks from different producers interleave
//! in whatever order their posts reached the queue.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::dispatch::error::{DispatchError, Result};

/// Unit of work posted to a runner
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// An execution context that accepts posted work
pub trait TaskRunner: Send + Sync {
    /// Queue `task` to run on this runner's context without waiting for it
    fn post_task(&self, task: Task) -> Result<()>;

    /// Whether the calling thread is this runner's context
    fn runs_tasks_on_current_thread(&self) -> bool;

    /// Name used in logs
    fn name(&self) -> &str;
}

impl fmt::Debug for dyn TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("name", &self.name())
            .finish()
    }
}

/// Messages understood by the runner thread
enum RunnerMessage {
    Run(Task),
    Flush(Sender<()>),
    Shutdown,
}

/// Task runner backed by a dedicated named thread
pub struct ThreadTaskRunner {
    name: String,
    task_tx: Sender<RunnerMessage>,
    thread_id: ThreadId,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadTaskRunner {
    /// Start a runner thread called `name`
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ThreadSpawn`] if the OS refuses the thread.
    pub fn spawn(name: &str) -> Result<Arc<Self>> {
        let (task_tx, task_rx) = crossbeam_channel::unbounded::<RunnerMessage>();

        let loop_name = name.to_string();
        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_task_loop(&loop_name, task_rx))?;

        let thread_id = thread_handle.thread().id();
        info!(runner = name, "Task runner thread started");

        Ok(Arc::new(Self {
            name: name.to_string(),
            task_tx,
            thread_id,
            thread_handle: Mutex::new(Some(thread_handle)),
        }))
    }

    /// Block until every task posted before this call has run
    ///
    /// Meant for orderly shutdown and tests; the bridge itself never waits
    /// on a runner.
    pub fn flush(&self) -> Result<()> {
        if self.runs_tasks_on_current_thread() {
            return Ok(());
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        self.task_tx
            .send(RunnerMessage::Flush(done_tx))
            .map_err(|_| DispatchError::RunnerClosed(self.name.clone()))?;
        done_rx
            .recv()
            .map_err(|_| DispatchError::RunnerClosed(self.name.clone()))
    }

    /// Stop the runner after the tasks already queued and join its thread
    pub fn shutdown(&self) -> Result<()> {
        if self.task_tx.send(RunnerMessage::Shutdown).is_err() {
            debug!(runner = %self.name, "Runner already stopped");
        }

        // A runner dropped from one of its own tasks cannot join itself.
        if self.runs_tasks_on_current_thread() {
            return Ok(());
        }

        if let Some(handle) = self.thread_handle.lock().take() {
            if handle.join().is_err() {
                error!(runner = %self.name, "Task runner panicked during shutdown");
                return Err(DispatchError::ThreadPanic(self.name.clone()));
            }
            info!(runner = %self.name, "Task runner shut down");
        }
        Ok(())
    }
}

impl TaskRunner for ThreadTaskRunner {
    fn post_task(&self, task: Task) -> Result<()> {
        self.task_tx
            .send(RunnerMessage::Run(task))
            .map_err(|_| DispatchError::RunnerClosed(self.name.clone()))
    }

    fn runs_tasks_on_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ThreadTaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadTaskRunner")
            .field("name", &self.name)
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

impl Drop for ThreadTaskRunner {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Failed to stop task runner: {}", e);
        }
    }
}

fn run_task_loop(name: &str, task_rx: Receiver<RunnerMessage>) {
    for message in task_rx.iter() {
        match message {
            RunnerMessage::Run(task) => task(),
            RunnerMessage::Flush(done_tx) => {
                let _ = done_tx.send(());
            }
            RunnerMessage::Shutdown => break,
        }
    }
    debug!(runner = name, "Task loop exited");
}
