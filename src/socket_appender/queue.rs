//! Bounded hand-off between producer threads and the dispatch loop.
//!
//! A single `crossbeam-channel` bounded channel backs the queue. Capacity zero
//! yields a rendezvous channel: an offer only succeeds while the dispatch loop
//! is blocked in [`EventQueue::take`]. Offers never block; anything that does
//! not fit is dropped and counted.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select};
use log::warn;

use super::cancel::{Cancellation, Cancelled};
use crate::rate_limited_warner::RateLimitedWarner;

pub struct EventQueue<E> {
    tx: Sender<E>,
    rx: Receiver<E>,
    capacity: usize,
    dropped: AtomicU64,
    warner: RateLimitedWarner,
    label: String,
}

impl<E> EventQueue<E> {
    /// Create a queue holding at most `capacity` events. `label` prefixes
    /// drop warnings.
    pub fn new(capacity: usize, warn_interval: Duration, label: impl Into<String>) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            capacity,
            dropped: AtomicU64::new(0),
            warner: RateLimitedWarner::new(warn_interval),
            label: label.into(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events currently buffered.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Total events refused since the queue was created.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Enqueue without blocking. Returns `false` when the event was dropped.
    pub fn offer(&self, event: E) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.warner.record_drop();
                self.warner.warn_if_due(|count| {
                    warn!("{}: queue full; dropped {count} events", self.label);
                });
                false
            }
        }
    }

    /// Block until an event is available or `cancel` fires. Events come out
    /// in arrival order.
    pub fn take(&self, cancel: &Cancellation) -> Result<E, Cancelled> {
        select! {
            recv(self.rx) -> event => event.map_err(|_| Cancelled),
            recv(cancel.receiver()) -> _ => Err(Cancelled),
        }
    }

    /// Report drops not yet covered by a warning.
    pub fn flush_warnings(&self) {
        self.warner.flush(|count| {
            warn!("{}: dropped {count} events in the last interval", self.label);
        });
    }
}

impl<E> std::fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("dropped", &self.dropped())
            .finish()
    }
}
