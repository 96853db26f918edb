// The fixed remote command surface.
//
// These strings must match the router's tooling exactly -- classification
// and parsing downstream depend on the output shapes these commands produce.

use crate::ops::speedtest::SpeedTestMode;
use crate::status::contains_any;

/// Query the service's running/stopped state.
pub const SERVICE_STATUS: &str = "/etc/init.d/openclash status";

/// Enable the config flag, commit, and start the service.
pub const SERVICE_ENABLE: &str =
    "uci set openclash.config.enable=1 && uci commit && /etc/init.d/openclash start";

/// Disable the config flag, commit, and stop the service.
pub const SERVICE_DISABLE: &str =
    "uci set openclash.config.enable=0 && uci commit && /etc/init.d/openclash stop";

/// Start the measurement helper daemonized.
pub const IPERF_SERVER_START: &str = "iperf3 -s -D";

/// Stop the measurement helper.
pub const IPERF_SERVER_STOP: &str = "killall iperf3";

/// Probe for leftover helper processes after teardown.
pub const IPERF_RESIDUAL_CHECK: &str = "ps | grep iperf3 | grep -v grep";

/// The client-side measurement command for the given protocol.
pub fn iperf_client(host: &str, mode: SpeedTestMode) -> String {
    match mode {
        SpeedTestMode::Udp => format!("iperf3 -c {host} -u -b 10M -t 5"),
        SpeedTestMode::Tcp => format!("iperf3 -c {host} -t 5"),
    }
}

/// Fixed-count latency probe (UDP mode only).
pub fn latency_probe(host: &str) -> String {
    format!("ping -c 4 {host}")
}

/// Markers meaning a measurement command did not do its job. Broader than
/// the status-probe failure set: iperf3 reports its own errors inline.
const MEASUREMENT_FAILURE_MARKERS: &[&str] =
    &["error", "failed", "not found", "no such file or directory"];

/// `true` when lowercased command output carries a measurement failure marker.
pub(crate) fn has_measurement_failure(lower: &str) -> bool {
    contains_any(lower, MEASUREMENT_FAILURE_MARKERS)
}
