#![allow(dead_code, clippy::unwrap_used)]
// Scripted transport doubles shared by the integration tests. The real
// wire is SSH, which has no mock-server equivalent, so the tests drive the
// `Connect`/`Exec` seams directly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;

use wrtlink_core::{
    CommandOutput, Connect, Credentials, Exec, LinkConfig, LinkManager, ServiceStatus, remote,
};
use wrtlink_ssh::Error;

pub const TEST_HOST: &str = "192.168.1.1";

/// Test configuration with delays shrunk to keep the suite fast.
pub fn test_config() -> LinkConfig {
    let mut config = LinkConfig::new(Credentials {
        host: TEST_HOST.into(),
        username: "root".into(),
        password: SecretString::from("secret"),
    });
    config.connect_timeout = Duration::from_secs(5);
    config.poll_interval = Duration::from_millis(25);
    config.toggle_settle = Duration::from_millis(10);
    config.speedtest_warmup = Duration::from_millis(5);
    config.teardown_settle = Duration::from_millis(5);
    config
}

pub fn out(stdout: &str) -> CommandOutput {
    CommandOutput {
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

// ── Scripted executor ───────────────────────────────────────────────

type Responder = dyn Fn(&str) -> Result<CommandOutput, Error> + Send + Sync;

pub struct FakeExec {
    respond: Box<Responder>,
    calls: Mutex<Vec<String>>,
}

impl FakeExec {
    pub fn new(
        respond: impl Fn(&str) -> Result<CommandOutput, Error> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| *c == command).count()
    }
}

/// `Exec` delegate so a test keeps its own `Arc<FakeExec>` for assertions.
pub struct SharedExec(pub Arc<FakeExec>);

impl Exec for SharedExec {
    fn run(&self, command: &str) -> Result<CommandOutput, Error> {
        self.0.calls.lock().unwrap().push(command.to_owned());
        (self.0.respond)(command)
    }
}

/// An executor that answers every status probe with the same text and every
/// other command with empty output.
pub fn status_exec(status_line: &'static str) -> Arc<FakeExec> {
    FakeExec::new(move |cmd| {
        if cmd == remote::SERVICE_STATUS {
            Ok(out(status_line))
        } else {
            Ok(out(""))
        }
    })
}

/// A stateful fake router: enable/disable commands flip the service, status
/// probes report it.
pub fn fake_router(initially_running: bool) -> Arc<FakeExec> {
    let running = Arc::new(AtomicBool::new(initially_running));
    FakeExec::new(move |cmd| {
        if cmd == remote::SERVICE_STATUS {
            Ok(out(if running.load(Ordering::SeqCst) {
                "openclash is running"
            } else {
                "openclash stopped"
            }))
        } else if cmd == remote::SERVICE_ENABLE {
            running.store(true, Ordering::SeqCst);
            Ok(out(""))
        } else if cmd == remote::SERVICE_DISABLE {
            running.store(false, Ordering::SeqCst);
            Ok(out(""))
        } else {
            Ok(out(""))
        }
    })
}

// ── Scripted connector ──────────────────────────────────────────────

pub enum ConnectStep {
    Ok(Arc<FakeExec>),
    Fail(&'static str),
    /// Hold the connect attempt open before succeeding.
    Delay(Duration, Arc<FakeExec>),
}

pub struct FakeConnector {
    steps: Mutex<VecDeque<ConnectStep>>,
    attempts: AtomicUsize,
}

impl FakeConnector {
    pub fn new(steps: Vec<ConnectStep>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connect for FakeConnector {
    fn open(&self, _credentials: &Credentials) -> Result<Box<dyn Exec>, Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.steps.lock().unwrap().pop_front() {
            Some(ConnectStep::Ok(exec)) => Ok(Box::new(SharedExec(exec))),
            Some(ConnectStep::Fail(message)) => Err(Error::Authentication {
                message: message.into(),
            }),
            Some(ConnectStep::Delay(delay, exec)) => {
                std::thread::sleep(delay);
                Ok(Box::new(SharedExec(exec)))
            }
            None => Err(Error::Transport("connect script exhausted".into())),
        }
    }
}

/// Build a manager over a single always-successful connect step.
pub fn manager_with(exec: Arc<FakeExec>) -> (LinkManager, Arc<FakeConnector>) {
    let connector = FakeConnector::new(vec![ConnectStep::Ok(exec)]);
    let mgr = LinkManager::new(test_config(), connector.clone());
    (mgr, connector)
}

// ── Await helpers ───────────────────────────────────────────────────

pub async fn wait_for_status(mgr: &LinkManager, want: ServiceStatus) {
    let mut rx = mgr.subscribe_service_status();
    tokio::time::timeout(Duration::from_secs(2), async {
        while *rx.borrow() != want {
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap_or_else(|_| panic!("service status never became {want}"));
}

pub async fn wait_for_state(mgr: &LinkManager, want: &wrtlink_core::LinkState) {
    let mut rx = mgr.subscribe_state();
    tokio::time::timeout(Duration::from_secs(2), async {
        while *rx.borrow() != *want {
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap_or_else(|_| panic!("link state never became {want:?}"));
}

/// Drain every notice currently buffered on the receiver.
pub fn drain_notices(
    rx: &mut tokio::sync::broadcast::Receiver<wrtlink_core::StatusNotice>,
) -> Vec<wrtlink_core::StatusNotice> {
    let mut drained = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        drained.push(notice);
    }
    drained
}
