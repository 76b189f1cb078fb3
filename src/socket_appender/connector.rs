//! Connection establishment with fixed-delay retries.

use std::{
    io,
    net::{SocketAddr, TcpStream},
    sync::Arc,
    time::Duration,
};

use log::info;

use super::{cancel::Cancellation, transport::SocketFactory};

/// Receives connector failures.
pub trait ExceptionHandler: Send + Sync {
    /// A connect attempt failed; the connector will retry after its delay.
    fn connection_failed(&self, err: &io::Error);

    /// The connector was cancelled before it produced a connection.
    fn connector_interrupted(&self) {}
}

/// Logs connector failures against a peer id.
#[derive(Clone, Debug)]
pub struct PeerReporter {
    peer_id: String,
}

impl PeerReporter {
    pub fn new(peer_id: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
        }
    }
}

impl ExceptionHandler for PeerReporter {
    fn connection_failed(&self, err: &io::Error) {
        if err.kind() == io::ErrorKind::ConnectionRefused {
            info!("{}connection refused", self.peer_id);
        } else {
            info!("{}{err}", self.peer_id);
        }
    }

    fn connector_interrupted(&self) {
        info!("{}connector interrupted", self.peer_id);
    }
}

/// Tries to connect to one address until it succeeds or is cancelled.
pub struct SocketConnector {
    address: SocketAddr,
    initial_delay: Duration,
    retry_delay: Duration,
    connect_timeout: Option<Duration>,
    factory: Arc<dyn SocketFactory>,
    handler: Arc<dyn ExceptionHandler>,
}

impl SocketConnector {
    pub fn new(
        address: SocketAddr,
        initial_delay: Duration,
        retry_delay: Duration,
        factory: Arc<dyn SocketFactory>,
        handler: Arc<dyn ExceptionHandler>,
    ) -> Self {
        Self {
            address,
            initial_delay,
            retry_delay,
            connect_timeout: None,
            factory,
            handler,
        }
    }

    /// Bound each connect attempt.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Run until connected or cancelled. Cancellation is checked before every
    /// attempt and after every wait; a connection obtained after cancellation
    /// is dropped.
    pub fn run(&self, cancel: &Cancellation) -> Option<TcpStream> {
        if cancel.sleep(self.initial_delay).is_err() {
            self.handler.connector_interrupted();
            return None;
        }
        loop {
            match self.factory.connect(self.address, self.connect_timeout) {
                Ok(stream) if !cancel.is_cancelled() => return Some(stream),
                Ok(_) => {
                    self.handler.connector_interrupted();
                    return None;
                }
                Err(err) => {
                    self.handler.connection_failed(&err);
                    if cancel.sleep(self.retry_delay).is_err() {
                        self.handler.connector_interrupted();
                        return None;
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for SocketConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketConnector")
            .field("address", &self.address)
            .field("initial_delay", &self.initial_delay)
            .field("retry_delay", &self.retry_delay)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::TcpListener,
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Instant,
    };

    use super::*;
    use crate::socket_appender::{cancel::cancellation, transport::TcpSocketFactory};
    use rstest::rstest;

    /// Refuses the first `failures` attempts, then connects for real.
    struct FlakyFactory {
        failures: usize,
        attempts: AtomicUsize,
    }

    impl SocketFactory for FlakyFactory {
        fn connect(&self, address: SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(io::Error::from(io::ErrorKind::ConnectionRefused));
            }
            TcpSocketFactory.connect(address, timeout)
        }
    }

    #[derive(Default)]
    struct CountingHandler {
        failures: AtomicUsize,
        interrupted: AtomicUsize,
    }

    impl ExceptionHandler for CountingHandler {
        fn connection_failed(&self, _err: &io::Error) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }

        fn connector_interrupted(&self) {
            self.interrupted.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn listener() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
        let addr = listener.local_addr().expect("listener has address");
        (listener, addr)
    }

    #[rstest]
    fn retries_until_the_listener_accepts() {
        let (_listener, addr) = listener();
        let factory = Arc::new(FlakyFactory {
            failures: 3,
            attempts: AtomicUsize::new(0),
        });
        let handler = Arc::new(CountingHandler::default());
        let connector = SocketConnector::new(
            addr,
            Duration::ZERO,
            Duration::from_millis(5),
            factory.clone(),
            handler.clone(),
        );
        let (_cancel_handle, cancel) = cancellation();
        let stream = connector.run(&cancel).expect("eventually connects");
        assert_eq!(stream.peer_addr().expect("peer"), addr);
        assert_eq!(factory.attempts.load(Ordering::SeqCst), 4);
        assert_eq!(handler.failures.load(Ordering::SeqCst), 3);
        assert_eq!(handler.interrupted.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    fn cancellation_stops_retrying() {
        let (listener, addr) = listener();
        drop(listener);
        let handler = Arc::new(CountingHandler::default());
        let connector = SocketConnector::new(
            addr,
            Duration::ZERO,
            Duration::from_secs(30),
            Arc::new(TcpSocketFactory),
            handler.clone(),
        );
        let (cancel_handle, cancel) = cancellation();
        let worker = thread::spawn(move || {
            let start = Instant::now();
            let result = connector.run(&cancel);
            (result.is_none(), start.elapsed())
        });
        thread::sleep(Duration::from_millis(100));
        cancel_handle.cancel();
        let (cancelled, elapsed) = worker.join().expect("connector thread");
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
        assert!(handler.failures.load(Ordering::SeqCst) >= 1);
        assert_eq!(handler.interrupted.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    fn cancelled_before_start_never_connects() {
        let (_listener, addr) = listener();
        let factory = Arc::new(FlakyFactory {
            failures: 0,
            attempts: AtomicUsize::new(0),
        });
        let connector = SocketConnector::new(
            addr,
            Duration::from_secs(30),
            Duration::ZERO,
            factory.clone(),
            Arc::new(CountingHandler::default()),
        );
        let (cancel_handle, cancel) = cancellation();
        cancel_handle.cancel();
        assert!(connector.run(&cancel).is_none());
        assert_eq!(factory.attempts.load(Ordering::SeqCst), 0);
    }
}
