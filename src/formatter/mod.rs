//! Formatter implementations used by text encoders.
//!
//! Provides the core [`FemtoFormatter`] trait, the [`DefaultFormatter`], and
//! two decorating formatters: [`HighlightingFormatter`] colours output by
//! level using ANSI escape sequences, and [`RelativeTimeFormatter`] renders
//! the time elapsed since a logger context was created.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::log_event::FemtoLogEvent;

pub mod ansi;
mod highlight;
mod relative;

pub use highlight::{HighlightStyles, HighlightingFormatter, StyleError};
pub use relative::{RelativeTimeFormatter, format_elapsed};

/// Trait for formatting log events into strings.
///
/// Implementors must be thread-safe (`Send + Sync`) so formatters can be
/// shared across threads in a logging system.
pub trait FemtoFormatter: Send + Sync {
    /// Format a log event into a string representation.
    fn format(&self, event: &FemtoLogEvent) -> String;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultFormatter;

impl FemtoFormatter for DefaultFormatter {
    fn format(&self, event: &FemtoLogEvent) -> String {
        let timestamp = DateTime::<Utc>::from(event.metadata.timestamp)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        format!(
            "{timestamp} {} [{}] {}",
            event.logger, event.level, event.message
        )
    }
}

/// Formats only `logger [LEVEL] message`, without a timestamp.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlainFormatter;

impl FemtoFormatter for PlainFormatter {
    fn format(&self, event: &FemtoLogEvent) -> String {
        format!("{} [{}] {}", event.logger, event.level, event.message)
    }
}

impl FemtoFormatter for Arc<dyn FemtoFormatter + Send + Sync> {
    fn format(&self, event: &FemtoLogEvent) -> String {
        (**self).format(event)
    }
}

impl FemtoFormatter for Box<dyn FemtoFormatter + Send + Sync> {
    fn format(&self, event: &FemtoLogEvent) -> String {
        (**self).format(event)
    }
}
