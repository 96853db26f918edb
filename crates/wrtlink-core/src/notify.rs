// Observer notification records.
//
// The core emits these over a broadcast channel; rendering (colors, layout,
// scrollback) belongs to the consumer.

use chrono::{DateTime, Local};

/// Color class of a notice. Consumers map this to their own palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
    /// An optimistic, not-yet-confirmed state report.
    Pending,
}

/// One observer-facing status record.
#[derive(Debug, Clone)]
pub struct StatusNotice {
    pub text: String,
    pub severity: Severity,
    /// Stamped at emission; observers display this as "time of last check".
    pub refreshed_at: DateTime<Local>,
}

impl StatusNotice {
    pub(crate) fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
            refreshed_at: Local::now(),
        }
    }
}
