//! Executors run the appender's background units of work.
//!
//! The socket appender never spawns threads itself: the dispatch loop and each
//! connector attempt are submitted to an [`Executor`] supplied by the
//! environment. [`ThreadExecutor`] is the default and runs each job on a
//! fresh named thread.

use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use thiserror::Error;

/// A unit of work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Raised when an executor refuses a job.
#[derive(Debug, Error)]
pub enum RejectedExecution {
    #[error("executor is shut down")]
    Shutdown,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Capability to run jobs asynchronously.
pub trait Executor: Send + Sync {
    /// Schedule `job`. `name` labels the job for diagnostics.
    fn submit(&self, name: &str, job: Job) -> Result<(), RejectedExecution>;
}

/// Executor running every job on its own detached thread.
#[derive(Debug, Default)]
pub struct ThreadExecutor {
    shut_down: AtomicBool,
}

impl ThreadExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject all further submissions. Running jobs are unaffected.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

impl Executor for ThreadExecutor {
    fn submit(&self, name: &str, job: Job) -> Result<(), RejectedExecution> {
        if self.is_shutdown() {
            return Err(RejectedExecution::Shutdown);
        }
        thread::Builder::new()
            .name(name.to_owned())
            .spawn(job)
            .map(drop)
            .map_err(RejectedExecution::Spawn)
    }
}
