// Link configuration.

use std::time::Duration;

use wrtlink_ssh::Credentials;

/// Configuration for one [`LinkManager`](crate::LinkManager).
///
/// Credentials are immutable once loaded. The duration fields default to the
/// values the system was tuned with; tests shrink them.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub credentials: Credentials,
    /// Session establishment budget.
    pub connect_timeout: Duration,
    /// Status probe cadence while connected.
    pub poll_interval: Duration,
    /// Pause between a toggle command and its confirmation probe.
    pub toggle_settle: Duration,
    /// Pause between starting the measurement helper and measuring.
    pub speedtest_warmup: Duration,
    /// Pause between stopping the helper and probing for leftovers.
    pub teardown_settle: Duration,
}

impl LinkConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            connect_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
            toggle_settle: Duration::from_secs(3),
            speedtest_warmup: Duration::from_secs(1),
            teardown_settle: Duration::from_secs(1),
        }
    }
}
