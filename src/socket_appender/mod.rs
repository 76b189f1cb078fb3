//! Reconnecting TCP appender.
//!
//! This module defines [`FemtoSocketAppender`], an appender that queues
//! events on the producer side and streams them through an [`Encoder`] to a
//! remote collector. A dispatch loop submitted to an [`Executor`] owns the
//! connection: it connects through a [`SocketConnector`] with a fixed retry
//! delay, drains the queue in order while connected, and starts over after
//! any I/O failure. Configuration can be assembled with
//! [`SocketAppenderBuilder`] or loaded from the `[appender]` section of an INI
//! file.
//!
//! [`Encoder`]: crate::encoder::Encoder
//! [`Executor`]: crate::executor::Executor

mod appender;
mod builder;
mod cancel;
mod config;
mod connector;
mod dispatch;
mod ini;
mod queue;
mod transport;


pub use appender::{FemtoLogAppender, FemtoSocketAppender, STOP_TIMEOUT};
pub use builder::{DEFAULT_APPENDER_NAME, SocketAppenderBuilder};
pub use cancel::{CancelHandle, Cancellation, Cancelled, cancellation};
pub use config::{
    ConfigError, DEFAULT_ACCEPT_CONNECTION_TIMEOUT_MS, DEFAULT_PORT, DEFAULT_QUEUE_SIZE,
    DEFAULT_RECONNECTION_DELAY_MS, MAX_QUEUE_SIZE, ResolvedTarget, SocketAppenderConfig,
};
pub use connector::{ExceptionHandler, PeerReporter, SocketConnector};
pub use dispatch::{CONNECTOR_JOB_NAME, DISPATCH_JOB_NAME, DispatchState, SharedEncoder};
pub use ini::APPENDER_SECTION;
pub use queue::EventQueue;
pub use transport::{ConnectionSlot, SocketFactory, TcpSocketFactory};
