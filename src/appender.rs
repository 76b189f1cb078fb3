//! Appender lifecycle trait and event post-processing hooks.

use thiserror::Error;

use crate::{
    executor::RejectedExecution, log_event::FemtoLogEvent, socket_appender::ConfigError,
};

/// Trait implemented by all appenders.
///
/// Appenders are shared between producer threads, so every method takes
/// `&self`. `append` must never block or fail the caller; delivery happens on
/// the appender's own worker.
pub trait FemtoAppender<E>: Send + Sync {
    /// Validate configuration and begin accepting events. Starting a started
    /// appender is a no-op.
    fn start(&self) -> Result<(), AppenderError>;

    /// Stop delivery and release resources. Stopping a stopped appender is a
    /// no-op.
    fn stop(&self);

    /// Offer an event for delivery. Ignored when the appender is not started.
    fn append(&self, event: E);

    fn is_started(&self) -> bool;
}

/// Errors that prevent an appender from starting.
#[derive(Debug, Error)]
pub enum AppenderError {
    #[error("invalid appender configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
    #[error("unknown host: {host}")]
    UnknownHost {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Rejected(#[from] RejectedExecution),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Hook run on the delivery thread for every event before it is encoded.
///
/// Use it to materialise lazily computed fields, or to strip data that must
/// not leave the process.
pub trait PostProcessor<E>: Send + Sync {
    fn post_process(&self, event: &mut E);
}

/// Leaves events untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPostProcessor;

impl<E> PostProcessor<E> for NoopPostProcessor {
    fn post_process(&self, _event: &mut E) {}
}

/// Decides whether caller location travels with a [`FemtoLogEvent`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CallerDataProcessor {
    include_caller_data: bool,
}

impl CallerDataProcessor {
    pub fn new(include_caller_data: bool) -> Self {
        Self {
            include_caller_data,
        }
    }

    pub fn include_caller_data(&self) -> bool {
        self.include_caller_data
    }
}

impl PostProcessor<FemtoLogEvent> for CallerDataProcessor {
    fn post_process(&self, event: &mut FemtoLogEvent) {
        if !self.include_caller_data {
            event.metadata.caller = None;
        }
    }
}
