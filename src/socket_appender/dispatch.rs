//! Dispatch loop driving socket I/O.
//!
//! The loop owns the connection lifecycle. Each cycle submits a
//! [`SocketConnector`] to the executor, waits for it on a one-shot channel,
//! then streams queued events through the encoder until the connection fails.
//! Any I/O error closes the connection and starts a new cycle; cancellation or
//! a rejected submission ends the loop.
//!
//! Every touch of the encoder happens under its lock after re-checking
//! cancellation. `stop()` writes the footer and fires the signal while holding
//! that lock, so the footer is the last thing the connection sees.

use std::{
    fmt, io,
    net::{Shutdown, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crossbeam_channel::{bounded, select};
use log::{error, info};
use parking_lot::Mutex;

use super::{
    cancel::Cancellation,
    config::ResolvedTarget,
    connector::{PeerReporter, SocketConnector},
    queue::EventQueue,
    transport::{ConnectionSlot, SocketFactory},
};
use crate::{appender::PostProcessor, encoder::Encoder, executor::Executor};

/// Thread name used for the dispatch loop job.
pub const DISPATCH_JOB_NAME: &str = "femto-socket-dispatch";
/// Thread name used for connector jobs.
pub const CONNECTOR_JOB_NAME: &str = "femto-socket-connector";

/// Encoder shared between the dispatch loop and `stop()`.
pub type SharedEncoder<E> = Arc<Mutex<Box<dyn Encoder<E>>>>;

/// Observable position of the dispatch loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Shutdown,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Idle => "idle",
            DispatchState::Connecting => "connecting",
            DispatchState::Connected => "connected",
            DispatchState::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

/// Shared, lock-protected [`DispatchState`].
#[derive(Clone, Debug, Default)]
pub struct StateCell(Arc<Mutex<DispatchState>>);

impl StateCell {
    pub fn get(&self) -> DispatchState {
        *self.0.lock()
    }

    pub fn set(&self, state: DispatchState) {
        *self.0.lock() = state;
    }
}

/// How a connected session ended.
#[derive(Debug)]
enum SessionEnd {
    /// I/O failed; reconnect.
    Failed(io::Error),
    /// Stop was requested.
    Cancelled,
    /// The encoder could not be bound; the appender is no longer usable.
    EncoderUnusable,
}

pub struct DispatchLoop<E, P> {
    pub(crate) name: String,
    pub(crate) target: ResolvedTarget,
    pub(crate) queue: Arc<EventQueue<E>>,
    pub(crate) encoder: SharedEncoder<E>,
    pub(crate) post_processor: Arc<P>,
    pub(crate) factory: Arc<dyn SocketFactory>,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) cancel: Cancellation,
    pub(crate) slot: Arc<ConnectionSlot>,
    pub(crate) state: StateCell,
    pub(crate) started: Arc<AtomicBool>,
}

impl<E, P> DispatchLoop<E, P>
where
    E: Send + 'static,
    P: PostProcessor<E> + 'static,
{
    pub fn run(self) {
        while !self.cancel.is_cancelled() {
            self.state.set(DispatchState::Connecting);
            let Some(stream) = self.await_connection() else {
                break;
            };
            match self.dispatch_events(stream) {
                SessionEnd::Failed(_) => continue,
                SessionEnd::Cancelled | SessionEnd::EncoderUnusable => break,
            }
        }
        self.slot.close();
        self.queue.flush_warnings();
        self.state.set(DispatchState::Shutdown);
        info!("{}: shutting down", self.name);
    }

    /// Submit a connector and wait for its connection. `None` means the loop
    /// must shut down.
    fn await_connection(&self) -> Option<TcpStream> {
        let connector = SocketConnector::new(
            self.target.address,
            std::time::Duration::ZERO,
            self.target.reconnection_delay,
            Arc::clone(&self.factory),
            Arc::new(PeerReporter::new(self.target.peer_id.clone())),
        )
        .with_connect_timeout(self.target.accept_timeout);
        let (tx, rx) = bounded(1);
        let cancel = self.cancel.clone();
        let submitted = self.executor.submit(
            CONNECTOR_JOB_NAME,
            Box::new(move || {
                if let Some(stream) = connector.run(&cancel) {
                    let _ = tx.send(stream);
                }
            }),
        );
        if let Err(err) = submitted {
            info!("{}: connector rejected: {err}", self.name);
            return None;
        }
        select! {
            recv(rx) -> stream => stream.ok(),
            recv(self.cancel.receiver()) -> _ => None,
        }
    }

    fn dispatch_events(&self, stream: TcpStream) -> SessionEnd {
        let peer = &self.target.peer_id;
        if let Ok(clone) = stream.try_clone() {
            self.slot.install(clone);
        }
        let end = self.stream_events(&stream);
        if let SessionEnd::Failed(err) = &end {
            info!("{peer}connection failed: {err}");
        }
        let _ = stream.shutdown(Shutdown::Both);
        self.slot.close();
        info!("{peer}connection closed");
        end
    }

    fn stream_events(&self, stream: &TcpStream) -> SessionEnd {
        if let Err(end) = self.init_encoder(stream) {
            return end;
        }
        info!("{}connection established", self.target.peer_id);
        self.state.set(DispatchState::Connected);
        loop {
            let Ok(mut event) = self.queue.take(&self.cancel) else {
                return SessionEnd::Cancelled;
            };
            self.post_processor.post_process(&mut event);
            let mut encoder = self.encoder.lock();
            if self.cancel.is_cancelled() {
                return SessionEnd::Cancelled;
            }
            if let Err(err) = encoder.encode(&event) {
                return SessionEnd::Failed(err);
            }
        }
    }

    /// Bind the encoder to the new connection while the accept timeout
    /// bounds writes, then switch the socket to blocking writes.
    fn init_encoder(&self, stream: &TcpStream) -> Result<(), SessionEnd> {
        stream
            .set_write_timeout(self.target.accept_timeout)
            .map_err(SessionEnd::Failed)?;
        let writer = stream.try_clone().map_err(SessionEnd::Failed)?;
        {
            let mut encoder = self.encoder.lock();
            if self.cancel.is_cancelled() {
                return Err(SessionEnd::Cancelled);
            }
            if let Err(err) = encoder.init(Box::new(writer)) {
                self.started.store(false, Ordering::Release);
                error!(
                    "Failed to initialize encoder for appender named [{}]: {err}",
                    self.name
                );
                return Err(SessionEnd::EncoderUnusable);
            }
            self.slot.mark_bound();
        }
        stream.set_write_timeout(None).map_err(SessionEnd::Failed)
    }
}
