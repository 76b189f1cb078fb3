//! Cooperative cancellation shared by the dispatch loop and its connector.
//!
//! The signal is a channel nobody ever sends on: cancelling drops the only
//! sender, so every receiver observes a disconnect at once. Blocking waits
//! `select!` on [`Cancellation::receiver`] to unwind promptly.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use parking_lot::Mutex;

/// Returned by waits interrupted through cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cancelled;

/// Owner side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: Mutex<Option<Sender<()>>>,
}

impl CancelHandle {
    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.tx.lock().take();
    }
}

/// Observer side of a cancellation signal.
#[derive(Clone, Debug)]
pub struct Cancellation {
    rx: Receiver<()>,
}

/// Create a linked handle/observer pair.
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = bounded(0);
    (
        CancelHandle {
            tx: Mutex::new(Some(tx)),
        },
        Cancellation { rx },
    )
}

impl Cancellation {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Wait for `delay`, returning early with [`Cancelled`] if the signal
    /// fires. A zero delay only checks the signal.
    pub fn sleep(&self, delay: Duration) -> Result<(), Cancelled> {
        match self.rx.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => Ok(()),
            _ => Err(Cancelled),
        }
    }

    /// Receiver that becomes ready (disconnected) once cancelled.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
