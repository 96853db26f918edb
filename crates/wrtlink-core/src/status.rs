// Service status classification.
//
// Raw init-script output is matched against substring markers. Precedence
// matters: failure markers win over everything (a missing tool must not read
// as "stopped"), and stopped markers are checked before running markers
// because "not running" contains "running".

use std::fmt;

/// Observed state of the remote service.
///
/// `Unknown` means an inconclusive or failed probe, never a default guess.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceStatus {
    Running,
    Stopped,
    #[default]
    Unknown,
}

impl ServiceStatus {
    /// The toggle target for this status. `Unknown` is treated as stopped so
    /// a deterministic action is always attempted after a failed probe.
    pub fn toggle_target(self) -> Self {
        match self {
            Self::Running => Self::Stopped,
            Self::Stopped | Self::Unknown => Self::Running,
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Markers meaning the status command itself did not execute.
pub(crate) const FAILURE_MARKERS: &[&str] = &["not found", "no such file or directory"];

const STOPPED_MARKERS: &[&str] = &["stopped", "inactive", "not running", "failed"];
const RUNNING_MARKERS: &[&str] = &["running", "active"];

/// Outcome of classifying one probe's raw output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: ServiceStatus,
    /// Present when the probe was inconclusive; carries the raw output for
    /// the log.
    pub diagnostic: Option<String>,
}

/// Classify raw status-command output.
pub fn classify_status(raw: &str) -> Classification {
    let lower = raw.to_lowercase();
    let lower = lower.trim();

    if contains_any(lower, FAILURE_MARKERS) {
        return Classification {
            status: ServiceStatus::Unknown,
            diagnostic: Some(format!("status command failed: {}", raw.trim())),
        };
    }
    if contains_any(lower, STOPPED_MARKERS) {
        return Classification {
            status: ServiceStatus::Stopped,
            diagnostic: None,
        };
    }
    if contains_any(lower, RUNNING_MARKERS) {
        return Classification {
            status: ServiceStatus::Running,
            diagnostic: None,
        };
    }
    Classification {
        status: ServiceStatus::Unknown,
        diagnostic: Some(format!("ambiguous status output: {}", raw.trim())),
    }
}

pub(crate) fn contains_any(lower: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| lower.contains(marker))
}
