// Bracketed throughput/latency measurement.
//
// Protocol: start the remote iperf3 helper daemonized, warm up, measure,
// parse, and tear the helper down. Teardown runs exactly once per
// invocation on every exit path, including an aborted start.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::link::{LinkManager, LinkState};
use crate::notify::Severity;
use crate::remote;

/// Measurement protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedTestMode {
    Tcp,
    Udp,
}

impl fmt::Display for SpeedTestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

/// Parsed measurement outcome. An absent field means the corresponding
/// pattern did not match -- absence is reported, never defaulted to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedTestResult {
    pub upload_mbps: Option<f64>,
    pub download_mbps: Option<f64>,
    pub latency_ms: Option<f64>,
}

impl SpeedTestResult {
    /// Human-readable one-line summary with `N/A` for absent fields.
    pub fn summary(&self) -> String {
        let fmt_rate = |v: Option<f64>| {
            v.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2} Mbit/s"))
        };
        let latency = self
            .latency_ms
            .map_or_else(|| "N/A".to_string(), |v| format!("{v:.1} ms"));
        format!(
            "upload {} / download {} / latency {}",
            fmt_rate(self.upload_mbps),
            fmt_rate(self.download_mbps),
            latency
        )
    }
}

impl LinkManager {
    /// Run one bracketed measurement against the host.
    ///
    /// A single attempt -- no retry of the measurement sub-operation. The
    /// helper teardown runs unconditionally once, whatever happens in the
    /// measurement phase.
    pub async fn run_speed_test(&self, mode: SpeedTestMode) -> Result<SpeedTestResult, CoreError> {
        if self.state() != LinkState::Connected {
            return Err(CoreError::NotConnected);
        }

        info!(%mode, "speed test starting");
        let result = self.speed_test_measure(mode).await;
        self.speed_test_teardown().await;

        match result {
            Ok(parsed) => {
                self.notice(
                    format!("{mode} speed test: {}", parsed.summary()),
                    Severity::Success,
                );
                Ok(parsed)
            }
            Err(err) => {
                self.notice(format!("{mode} speed test failed: {err}"), Severity::Error);
                Err(err)
            }
        }
    }

    async fn speed_test_measure(&self, mode: SpeedTestMode) -> Result<SpeedTestResult, CoreError> {
        let start = self.run_remote(remote::IPERF_SERVER_START).await?;
        let start_combined = start.combined();
        if remote::has_measurement_failure(&start_combined.to_lowercase()) {
            warn!(output = %start_combined.trim(), "measurement helper failed to start");
            return Err(CoreError::Command {
                message: format!("helper start failed: {}", start_combined.trim()),
            });
        }
        debug!("measurement helper started, warming up");
        tokio::time::sleep(self.inner.config.speedtest_warmup).await;

        let host = self.inner.config.credentials.host.clone();
        let client_output = self
            .run_remote(&remote::iperf_client(&host, mode))
            .await?;
        let raw = client_output.combined();
        if remote::has_measurement_failure(&raw.to_lowercase()) {
            // Not fatal: summary lines may still be present and parseable.
            warn!(output = %raw.trim(), "measurement client reported errors");
        }

        let mut result = SpeedTestResult::default();
        match mode {
            SpeedTestMode::Udp => {
                result.upload_mbps = last_marked_rate(&raw, "sender");
                if result.upload_mbps.is_none() {
                    warn!("no sender rate in client output, upload left absent");
                }
                result.download_mbps = last_marked_rate(&raw, "receiver");
                if result.download_mbps.is_none() {
                    warn!("no receiver rate in client output, download left absent");
                }
                result.latency_ms = self.measure_latency(&host).await?;
            }
            SpeedTestMode::Tcp => {
                result.download_mbps = tcp_summary_rate(&raw);
                if result.download_mbps.is_none() {
                    warn!("no summary rate in client output, download left absent");
                }
            }
        }
        Ok(result)
    }

    /// Fixed-count echo probe; degrades to absent on any command failure.
    async fn measure_latency(&self, host: &str) -> Result<Option<f64>, CoreError> {
        let output = match self.run_remote(&remote::latency_probe(host)).await {
            Ok(output) => output,
            Err(CoreError::Command { message }) => {
                warn!(%message, "latency probe command failed, latency left absent");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let latency = parse_latency(&output.combined());
        if latency.is_none() {
            warn!("no min/avg/max line in probe output, latency left absent");
        }
        Ok(latency)
    }

    /// Stop the helper and verify nothing is left behind. Runs on every
    /// exit path of the measurement phase; failures here are logged, never
    /// propagated.
    async fn speed_test_teardown(&self) {
        match self.run_remote(remote::IPERF_SERVER_STOP).await {
            Ok(output) => {
                let combined = output.combined();
                if remote::has_measurement_failure(&combined.to_lowercase()) {
                    warn!(output = %combined.trim(), "helper stop may have failed");
                } else {
                    debug!("helper stop sent");
                }
            }
            Err(err) => {
                warn!(error = %err, "helper stop could not be sent");
            }
        }

        tokio::time::sleep(self.inner.config.teardown_settle).await;

        match self.run_remote(remote::IPERF_RESIDUAL_CHECK).await {
            Ok(output) if output.is_empty() => {
                info!("helper teardown confirmed clean");
            }
            Ok(output) => {
                warn!(processes = %output.combined().trim(), "helper processes may remain");
            }
            Err(err) => {
                warn!(error = %err, "teardown verification failed");
            }
        }
    }
}

// ── Output parsing ───────────────────────────────────────────────

fn rate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.?\d*)\s*(K|M|G)?bits/sec").expect("valid rate pattern"))
}

fn latency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:round-trip\s+)?min/avg/max\s*=\s*[0-9.]+/([0-9.]+)/[0-9.]+\s*ms")
            .expect("valid latency pattern")
    })
}

/// Extract a rate from one line and normalize to Mbit/s.
fn parse_rate(line: &str) -> Option<f64> {
    let caps = rate_re().captures(line)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(match caps.get(2).map(|m| m.as_str()) {
        Some("K") => value / 1024.0,
        Some("G") => value * 1024.0,
        _ => value,
    })
}

/// Rate from the last line containing `marker` (iperf3 prints interval rows
/// first, summary rows last).
fn last_marked_rate(raw: &str, marker: &str) -> Option<f64> {
    raw.lines()
        .filter(|line| line.contains(marker))
        .next_back()
        .and_then(parse_rate)
}

/// TCP download rate: the last summary-ish line.
fn tcp_summary_rate(raw: &str) -> Option<f64> {
    raw.lines()
        .filter(|line| {
            line.contains("receiver") || line.contains("SUM") || line.contains("bits/sec")
        })
        .next_back()
        .and_then(parse_rate)
}

/// Average latency: the middle value of the min/avg/max triple.
fn parse_latency(raw: &str) -> Option<f64> {
    latency_re()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
