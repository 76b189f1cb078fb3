//! Log event representation shipped by the socket appender.
//!
//! `FemtoLogEvent` captures the logger name, level and message of a log call
//! together with runtime metadata (timestamp, thread) and optional caller
//! location. The caller location is the expensive part of an event and can be
//! stripped by [`CallerDataProcessor`](crate::CallerDataProcessor) before the
//! event is encoded.

use std::collections::BTreeMap;
use std::fmt;
use std::thread::{self, ThreadId};
use std::time::SystemTime;

use crate::level::FemtoLevel;

/// Source location of the log call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallerData {
    /// Rust module path where the log call originated.
    pub module_path: String,
    /// Source file name for the log call.
    pub filename: String,
    /// Line number in the source file.
    pub line_number: u32,
}

impl CallerData {
    pub fn new(module_path: &str, filename: &str, line_number: u32) -> Self {
        Self {
            module_path: module_path.to_owned(),
            filename: filename.to_owned(),
            line_number,
        }
    }
}

/// Runtime context captured when the event is created.
#[derive(Clone, Debug)]
pub struct EventMetadata {
    /// Time the event was created.
    pub timestamp: SystemTime,
    /// ID of the thread that created the event.
    pub thread_id: ThreadId,
    /// Name of the thread that created the event (if any).
    pub thread_name: Option<String>,
    /// Location of the log call, when known.
    pub caller: Option<CallerData>,
    /// Structured key-value pairs attached to the event.
    pub key_values: BTreeMap<String, String>,
}

impl Default for EventMetadata {
    fn default() -> Self {
        let current = thread::current();
        Self {
            timestamp: SystemTime::now(),
            thread_id: current.id(),
            thread_name: current.name().map(ToString::to_string),
            caller: None,
            key_values: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FemtoLogEvent {
    /// Name of the logger that created this event.
    pub logger: String,
    pub level: FemtoLevel,
    pub message: String,
    pub metadata: EventMetadata,
}

impl FemtoLogEvent {
    /// Construct an event from logger `name`, `level`, and `message`.
    pub fn new(logger: &str, level: FemtoLevel, message: &str) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            metadata: EventMetadata::default(),
        }
    }

    pub fn with_caller(mut self, caller: CallerData) -> Self {
        self.metadata.caller = Some(caller);
        self
    }

    pub fn with_key_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.key_values.insert(key.into(), value.into());
        self
    }

    /// Override the capture time, e.g. when replaying events.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.metadata.timestamp = timestamp;
        self
    }
}

impl fmt::Display for FemtoLogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
