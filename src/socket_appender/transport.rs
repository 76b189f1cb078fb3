//! Transport primitives for the socket appender.

use std::{
    io,
    net::{Shutdown, SocketAddr, TcpStream},
    time::Duration,
};

use parking_lot::Mutex;

/// Creates raw connections to the remote collector.
pub trait SocketFactory: Send + Sync {
    /// Open one connection. `timeout` bounds the connect call; `None` uses
    /// the operating system default.
    fn connect(&self, address: SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream>;
}

/// Plain TCP with Nagle disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpSocketFactory;

impl SocketFactory for TcpSocketFactory {
    fn connect(&self, address: SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
        let stream = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&address, timeout)?,
            None => TcpStream::connect(address)?,
        };
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Parks a clone of the live connection so `stop()` can shut it down from
/// another thread.
///
/// Only the dispatch loop installs connections. Closing is idempotent and
/// tolerates racing with a replacement: whichever stream is parked at the time
/// is shut down, and an empty slot is ignored.
#[derive(Debug, Default)]
pub struct ConnectionSlot {
    inner: Mutex<SlotInner>,
}

#[derive(Debug, Default)]
struct SlotInner {
    stream: Option<TcpStream>,
    /// The encoder has written its header to `stream`.
    bound: bool,
}

impl ConnectionSlot {
    pub fn install(&self, stream: TcpStream) {
        let mut inner = self.inner.lock();
        inner.bound = false;
        if let Some(previous) = inner.stream.replace(stream) {
            let _ = previous.shutdown(Shutdown::Both);
        }
    }

    /// Record that the encoder now writes to the parked connection.
    pub fn mark_bound(&self) {
        let mut inner = self.inner.lock();
        inner.bound = inner.stream.is_some();
    }

    /// A connection is parked and the encoder is bound to it.
    pub fn is_live(&self) -> bool {
        let inner = self.inner.lock();
        inner.bound && inner.stream.is_some()
    }

    /// Shut the parked connection down, ignoring errors.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.bound = false;
        if let Some(stream) = inner.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}
