//! Core library for femtoappender.
//!
//! The crate ships a reconnecting, queued TCP appender
//! ([`FemtoSocketAppender`]) together with the pieces it is assembled from:
//! encoders that frame events on the wire, formatters for line-oriented
//! output, and the executor abstraction the appender runs its background
//! work on.

pub mod appender;
pub mod encoder;
pub mod executor;
pub mod formatter;
pub mod level;
pub mod log_event;
pub mod rate_limited_warner;
pub mod socket_appender;

pub use appender::{
    AppenderError, CallerDataProcessor, FemtoAppender, NoopPostProcessor, PostProcessor,
};
pub use encoder::{Encoder, JsonEncoder, LineEncoder, MessagePackEncoder};
pub use executor::{Executor, Job, RejectedExecution, ThreadExecutor};
pub use formatter::{
    DefaultFormatter, FemtoFormatter, HighlightStyles, HighlightingFormatter, PlainFormatter,
    RelativeTimeFormatter, StyleError,
};
pub use level::{FemtoLevel, ParseLevelError};
pub use log_event::{CallerData, EventMetadata, FemtoLogEvent};
pub use socket_appender::{
    ConfigError, DispatchState, FemtoLogAppender, FemtoSocketAppender, SocketAppenderBuilder,
    SocketAppenderConfig, SocketFactory, TcpSocketFactory,
};
