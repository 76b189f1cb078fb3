//! Elapsed-time rendering relative to a logger context's birth time.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use super::FemtoFormatter;
use crate::log_event::FemtoLogEvent;

/// Render `elapsed_ms` as `HH:MM:SS,mmm`, prefixed with `Www-d ` once at least
/// one day has passed.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let ms = elapsed_ms % 1000;
    let total_secs = elapsed_ms / 1000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = (total_secs / 3600) % 24;
    let total_days = total_secs / 86_400;
    let d = total_days % 7;
    let w = total_days / 7;

    if total_days > 0 {
        format!("W{w:02}-{d} {h:02}:{m:02}:{s:02},{ms:03}")
    } else {
        format!("{h:02}:{m:02}:{s:02},{ms:03}")
    }
}

fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Formatter prefixing each line with the time elapsed since `birth`.
///
/// Consecutive events sharing a millisecond timestamp reuse the cached
/// rendering.
#[derive(Debug)]
pub struct RelativeTimeFormatter {
    birth_ms: u64,
    cache: Mutex<Option<(u64, String)>>,
}

impl RelativeTimeFormatter {
    pub fn new(birth: SystemTime) -> Self {
        Self {
            birth_ms: epoch_millis(birth),
            cache: Mutex::new(None),
        }
    }

    /// Start the clock now.
    pub fn starting_now() -> Self {
        Self::new(SystemTime::now())
    }

    /// Elapsed time for `event`. Events stamped before the birth time render
    /// as zero.
    pub fn relative(&self, event: &FemtoLogEvent) -> String {
        let now = epoch_millis(event.metadata.timestamp);
        let mut cache = self.cache.lock();
        match cache.as_ref() {
            Some((stamp, rendered)) if *stamp == now => rendered.clone(),
            _ => {
                let rendered = format_elapsed(now.saturating_sub(self.birth_ms));
                *cache = Some((now, rendered.clone()));
                rendered
            }
        }
    }
}

impl FemtoFormatter for RelativeTimeFormatter {
    fn format(&self, event: &FemtoLogEvent) -> String {
        format!(
            "{} {} [{}] {}",
            self.relative(event),
            event.logger,
            event.level,
            event.message
        )
    }
}
