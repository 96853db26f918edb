// ── Link lifecycle ──
//
// Full lifecycle management for the administrative SSH link: connection
// state machine, single in-flight connect guard, forced teardown on
// connectivity loss, and the status poll task bound to the Connected state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wrtlink_ssh::{CommandOutput, Connect, Exec};

use crate::config::LinkConfig;
use crate::error::CoreError;
use crate::net::NetworkEvent;
use crate::notify::{Severity, StatusNotice};
use crate::remote;
use crate::status::{ServiceStatus, classify_status};

const NOTICE_CHANNEL_SIZE: usize = 256;

// ── LinkState ────────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

// ── LinkManager ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<LinkInner>`. Owns the session exclusively:
/// callers never see the raw handle, only the operations defined here and in
/// the `ops` modules.
#[derive(Clone)]
pub struct LinkManager {
    pub(crate) inner: Arc<LinkInner>,
}

pub(crate) struct LinkInner {
    pub(crate) config: LinkConfig,
    connector: Arc<dyn Connect>,
    state: watch::Sender<LinkState>,
    notices: broadcast::Sender<StatusNotice>,
    service_status: watch::Sender<ServiceStatus>,
    last_checked: watch::Sender<Option<DateTime<Local>>>,
    /// The only datum shared across concurrent connect attempts: exactly one
    /// proceeds, the loser is a no-op.
    connecting: AtomicBool,
    exec: Mutex<Option<Arc<dyn Exec>>>,
    /// Parent token, cancelled on shutdown.
    cancel: CancellationToken,
    /// Child token for the current connection -- cancelled on disconnect,
    /// replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

impl LinkManager {
    /// Create a new manager. Does NOT connect -- call
    /// [`connect()`](Self::connect), or feed it [`NetworkEvent`]s.
    pub fn new(config: LinkConfig, connector: Arc<dyn Connect>) -> Self {
        let (state, _) = watch::channel(LinkState::Disconnected);
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let (service_status, _) = watch::channel(ServiceStatus::Unknown);
        let (last_checked, _) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(LinkInner {
                config,
                connector,
                state,
                notices,
                service_status,
                last_checked,
                connecting: AtomicBool::new(false),
                exec: Mutex::new(None),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                poll_handle: Mutex::new(None),
            }),
        }
    }

    /// Access the link configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.inner.config
    }

    // ── State observation ────────────────────────────────────────

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to link state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<LinkState> {
        self.inner.state.subscribe()
    }

    /// Last reported service status.
    pub fn service_status(&self) -> ServiceStatus {
        *self.inner.service_status.borrow()
    }

    /// Subscribe to debounced service status changes.
    pub fn subscribe_service_status(&self) -> watch::Receiver<ServiceStatus> {
        self.inner.service_status.subscribe()
    }

    /// Subscribe to the "time of last check" stamp, refreshed on every
    /// probe whether or not the status changed.
    pub fn subscribe_last_checked(&self) -> watch::Receiver<Option<DateTime<Local>>> {
        self.inner.last_checked.subscribe()
    }

    /// Subscribe to the observer notice stream.
    pub fn notices(&self) -> broadcast::Receiver<StatusNotice> {
        self.inner.notices.subscribe()
    }

    pub(crate) fn notice(&self, text: impl Into<String>, severity: Severity) {
        let _ = self.inner.notices.send(StatusNotice::new(text, severity));
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the host and start status monitoring.
    ///
    /// Idempotent: while Connecting or Connected this returns the current
    /// state without starting a duplicate attempt. On failure the state is
    /// `Error(reason)` and no retry is scheduled here -- retries are driven
    /// by connectivity events or explicit calls.
    pub async fn connect(&self) -> Result<LinkState, CoreError> {
        let current = self.state();
        if matches!(current, LinkState::Connecting | LinkState::Connected) {
            debug!(state = ?current, "connect skipped, attempt already live");
            return Ok(current);
        }

        if self
            .inner
            .connecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("connect skipped, another attempt holds the flag");
            return Ok(self.state());
        }

        let result = self.connect_attempt().await;
        // Cleared on every exit path, success or failure.
        self.inner.connecting.store(false, Ordering::SeqCst);
        result
    }

    async fn connect_attempt(&self) -> Result<LinkState, CoreError> {
        self.inner.state.send_replace(LinkState::Connecting);
        self.notice("establishing link...", Severity::Info);
        info!(host = %self.inner.config.credentials.host, "connecting");

        let connector = Arc::clone(&self.inner.connector);
        let credentials = self.inner.config.credentials.clone();
        let attempt = tokio::task::spawn_blocking(move || connector.open(&credentials));

        let timeout = self.inner.config.connect_timeout;
        let opened = match tokio::time::timeout(timeout, attempt).await {
            Err(_) => {
                // The blocking attempt keeps running to completion; any
                // session it eventually opens is dropped with the task.
                let reason = format!("connect timed out after {}s", timeout.as_secs());
                self.fail_connect(&reason);
                return Err(CoreError::Connection { reason });
            }
            Ok(Err(join_err)) => {
                let reason = format!("connect task failed: {join_err}");
                self.fail_connect(&reason);
                return Err(CoreError::Connection { reason });
            }
            Ok(Ok(Err(err))) => {
                let reason = err.to_string();
                self.fail_connect(&reason);
                return Err(CoreError::Connection { reason });
            }
            Ok(Ok(Ok(exec))) => exec,
        };

        *self.inner.exec.lock().await = Some(Arc::from(opened));

        // Fresh child token for this connection; the poller's lifetime is
        // bound to it.
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        // Connected must be visible before the poller's first tick runs.
        self.inner.state.send_replace(LinkState::Connected);
        let mgr = self.clone();
        *self.inner.poll_handle.lock().await = Some(tokio::spawn(status_poll_task(mgr, child)));

        self.notice("link established", Severity::Success);
        info!("link established, status monitoring started");
        Ok(LinkState::Connected)
    }

    fn fail_connect(&self, reason: &str) {
        self.inner
            .state
            .send_replace(LinkState::Error(reason.to_owned()));
        self.notice(format!("link failed: {reason}"), Severity::Error);
        warn!(reason, "connect attempt failed");
    }

    /// Tear the link down from any state.
    ///
    /// Closes the session if open, cancels the poller at its next suspension
    /// point, resets the service status to Unknown, and notifies observers
    /// with the supplied reason. Driven by connectivity-loss events,
    /// transport faults, and application teardown.
    pub async fn disconnect_forced(&self, reason: &str) {
        self.inner.cancel_child.lock().await.cancel();
        // The poller may be the caller of this function (via a transport
        // fault), so it is detached rather than joined; cancellation stops
        // it at its next suspension point.
        drop(self.inner.poll_handle.lock().await.take());

        *self.inner.exec.lock().await = None;
        self.inner.state.send_replace(LinkState::Disconnected);
        self.inner.service_status.send_replace(ServiceStatus::Unknown);
        self.notice(format!("link closed ({reason})"), Severity::Warning);
        debug!(reason, "forced disconnect");
    }

    /// Application teardown: disconnect and cancel all consumer loops.
    pub async fn shutdown(&self) {
        self.disconnect_forced("shutting down").await;
        self.inner.cancel.cancel();
    }

    /// One-shot: connect, run closure, shut down.
    ///
    /// Optimized for single CLI invocations where nothing outlives the one
    /// operation.
    pub async fn oneshot<F, Fut, T>(
        config: LinkConfig,
        connector: Arc<dyn Connect>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(LinkManager) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mgr = LinkManager::new(config, connector);
        mgr.connect().await?;
        let result = f(mgr.clone()).await;
        mgr.shutdown().await;
        result
    }

    // ── Network event consumption ────────────────────────────────

    /// Consume connectivity events until the channel closes or the manager
    /// shuts down. Spawn this alongside the manager.
    pub async fn run_network_events(&self, mut rx: mpsc::Receiver<NetworkEvent>) {
        let cancel = self.inner.cancel.clone();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    self.handle_network_event(event).await;
                }
            }
        }
        debug!("network event consumer stopped");
    }

    /// React to a single connectivity event.
    pub async fn handle_network_event(&self, event: NetworkEvent) {
        debug!(?event, "network event");
        match event {
            NetworkEvent::LinkAvailable => {
                if let Err(e) = self.connect().await {
                    warn!(error = %e, "connect after link-available failed");
                }
            }
            NetworkEvent::LinkLost => {
                self.disconnect_forced("link lost").await;
            }
            NetworkEvent::CapabilityChanged { internet: true } => {
                let connected = self.state() == LinkState::Connected;
                let connecting = self.inner.connecting.load(Ordering::SeqCst);
                if !connected && !connecting {
                    if let Err(e) = self.connect().await {
                        warn!(error = %e, "connect after capability gain failed");
                    }
                }
            }
            NetworkEvent::CapabilityChanged { internet: false } => {
                if self.state() == LinkState::Connected {
                    self.disconnect_forced("internet capability lost").await;
                }
            }
        }
    }

    // ── Remote execution ─────────────────────────────────────────

    /// Run one remote command on the live session.
    ///
    /// Transport faults escalate: the link is torn down before the error is
    /// returned. Channel-scoped failures surface as `Command` and leave the
    /// session alone.
    pub(crate) async fn run_remote(&self, command: &str) -> Result<CommandOutput, CoreError> {
        let exec = self
            .inner
            .exec
            .lock()
            .await
            .clone()
            .ok_or(CoreError::NotConnected)?;

        let cmd = command.to_owned();
        let joined = tokio::task::spawn_blocking(move || exec.run(&cmd)).await;
        let result = joined.map_err(|e| CoreError::Connection {
            reason: format!("executor task failed: {e}"),
        })?;

        match result {
            Ok(output) => Ok(output),
            Err(err) if err.is_transport() => {
                warn!(error = %err, command, "transport fault during remote command");
                self.disconnect_forced("transport error").await;
                Err(CoreError::Connection {
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(CoreError::from_exec(&err)),
        }
    }

    // ── Status probing ───────────────────────────────────────────

    /// Probe the service status once and report it through the debounced
    /// channels. Used by the poll task and the toggle confirmation.
    pub async fn probe_status(&self) -> Result<ServiceStatus, CoreError> {
        let output = match self.run_remote(remote::SERVICE_STATUS).await {
            Ok(output) => output,
            Err(CoreError::Command { message }) => {
                // A failed probe reads as Unknown, never as a guess.
                warn!(%message, "status probe command failed");
                self.apply_status(ServiceStatus::Unknown);
                return Ok(ServiceStatus::Unknown);
            }
            Err(err) => return Err(err),
        };

        let classified = classify_status(&output.combined());
        if let Some(diagnostic) = &classified.diagnostic {
            warn!("{diagnostic}");
        }
        self.apply_status(classified.status);
        Ok(classified.status)
    }

    /// Record a probe result: the last-checked stamp moves every time, the
    /// status channel and notice stream only on change.
    ///
    /// A probe that was already in flight when the link went down reports
    /// nothing -- once the state leaves Connected, no further status
    /// notifications are emitted.
    fn apply_status(&self, status: ServiceStatus) {
        if *self.inner.state.borrow() != LinkState::Connected {
            debug!(%status, "discarding probe result, link no longer connected");
            return;
        }
        self.inner.last_checked.send_replace(Some(Local::now()));

        let previous = *self.inner.service_status.borrow();
        if previous == status {
            return;
        }
        self.inner.service_status.send_replace(status);
        let (text, severity) = match status {
            ServiceStatus::Running => ("service running", Severity::Success),
            ServiceStatus::Stopped => ("service stopped", Severity::Warning),
            ServiceStatus::Unknown => ("service status unknown", Severity::Info),
        };
        self.notice(text, severity);
        info!(from = %previous, to = %status, "service status changed");
    }
}

// ── Status poll task ─────────────────────────────────────────────

/// Periodic status probe, alive exactly as long as the link is Connected.
///
/// The first tick fires immediately so observers get a reading right after
/// connect; on leaving Connected the loop stops without emitting further
/// notifications.
async fn status_poll_task(mgr: LinkManager, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(mgr.inner.config.poll_interval);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if mgr.state() != LinkState::Connected {
                    break;
                }
                if let Err(e) = mgr.probe_status().await {
                    // Transport faults have already torn the link down.
                    debug!(error = %e, "status poll aborted");
                    break;
                }
            }
        }
    }
    debug!("status poller stopped");
}
