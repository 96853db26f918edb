// Service toggle mediation.
//
// Two-phase reporting: an optimistic notice goes out before the flip
// command, and the operation's outcome is whatever the confirmation probe
// observes afterwards -- never the flip command's exit alone.

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::link::{LinkManager, LinkState};
use crate::notify::Severity;
use crate::remote;
use crate::status::{FAILURE_MARKERS, ServiceStatus, contains_any};

impl LinkManager {
    /// Flip the service to the opposite of its last observed state.
    ///
    /// Requires a connected link. An Unknown last status is treated as
    /// stopped, so the start command is always the deterministic fallback.
    /// Returns the status confirmed by the post-settle probe.
    ///
    /// A second toggle issued while one is in flight is not queued; the
    /// regular poller converges both to ground truth since identical status
    /// reports are debounced.
    pub async fn toggle(&self) -> Result<ServiceStatus, CoreError> {
        if self.state() != LinkState::Connected {
            return Err(CoreError::NotConnected);
        }

        let last = self.service_status();
        let target = last.toggle_target();
        let (command, pending) = match target {
            ServiceStatus::Running => (remote::SERVICE_ENABLE, "service starting..."),
            _ => (remote::SERVICE_DISABLE, "service stopping..."),
        };

        self.notice(pending, Severity::Pending);
        debug!(%last, %target, "issuing toggle command");

        match self.run_remote(command).await {
            Ok(output) => {
                let combined = output.combined();
                if contains_any(&combined.to_lowercase(), FAILURE_MARKERS) {
                    self.notice(
                        format!("toggle command failed: {}", combined.trim()),
                        Severity::Error,
                    );
                    warn!(output = %combined.trim(), "toggle command reported failure");
                } else {
                    // Acceptance only -- the probe below is the verdict.
                    self.notice("toggle command sent, awaiting confirmation", Severity::Info);
                }
            }
            Err(CoreError::Command { message }) => {
                self.notice(format!("toggle command failed: {message}"), Severity::Error);
                warn!(%message, "toggle command could not be executed");
            }
            Err(err) => return Err(err),
        }

        tokio::time::sleep(self.inner.config.toggle_settle).await;
        self.probe_status().await
    }
}
