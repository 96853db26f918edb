// Real SSH transport over libssh2.
//
// `SshConnector` establishes password-authenticated sessions; `SshSession`
// wraps an established session behind a mutex so commands are serialized --
// the session is exclusively owned by its connection manager and executors
// only borrow it per call.

use std::io::Read;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use std::time::Duration;

use secrecy::ExposeSecret;
use tracing::{debug, trace};

use crate::error::{self, Error};
use crate::exec::{CommandOutput, Connect, Credentials, Exec};

/// The administrative port is fixed, not configurable.
pub const SSH_PORT: u16 = 22;

/// Transport knobs for session establishment and command execution.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// TCP connect + handshake + auth budget.
    pub connect_timeout: Duration,
    /// Per-blocking-operation budget once the session is up. Must exceed the
    /// longest remote command (a 5 s iperf3 run plus reporting).
    pub exec_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            exec_timeout: Duration::from_secs(30),
        }
    }
}

/// Opens password-authenticated sessions against the fixed port.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    config: TransportConfig,
}

impl SshConnector {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    fn resolve(&self, host: &str) -> Result<SocketAddr, Error> {
        (host, SSH_PORT)
            .to_socket_addrs()
            .map_err(|e| Error::Transport(format!("address lookup for {host}: {e}")))?
            .next()
            .ok_or_else(|| Error::Resolve {
                host: host.to_owned(),
            })
    }
}

impl Connect for SshConnector {
    fn open(&self, credentials: &Credentials) -> Result<Box<dyn Exec>, Error> {
        let addr = self.resolve(&credentials.host)?;
        debug!(host = %credentials.host, %addr, "opening SSH session");

        let tcp = TcpStream::connect_timeout(&addr, self.config.connect_timeout)
            .map_err(|e| Error::Transport(format!("tcp connect to {addr}: {e}")))?;

        let mut session = ssh2::Session::new()
            .map_err(|e| Error::Transport(format!("session init: {}", e.message())))?;
        session.set_tcp_stream(tcp);

        #[allow(clippy::cast_possible_truncation)]
        let handshake_ms = self.config.connect_timeout.as_millis() as u32;
        session.set_timeout(handshake_ms);
        session.handshake().map_err(|e| error::connect_error(&e))?;

        session
            .userauth_password(
                &credentials.username,
                credentials.password.expose_secret(),
            )
            .map_err(|e| error::connect_error(&e))?;
        if !session.authenticated() {
            return Err(Error::Authentication {
                message: "server rejected password".into(),
            });
        }

        #[allow(clippy::cast_possible_truncation)]
        let exec_ms = self.config.exec_timeout.as_millis() as u32;
        session.set_timeout(exec_ms);

        debug!(host = %credentials.host, "SSH session established");
        Ok(Box::new(SshSession {
            session: Mutex::new(session),
        }))
    }
}

/// An established session. One exec channel is opened per command and
/// released on every exit path -- no channel outlives its `run` call.
pub struct SshSession {
    session: Mutex<ssh2::Session>,
}

impl Exec for SshSession {
    fn run(&self, command: &str) -> Result<CommandOutput, Error> {
        trace!(command, "exec");
        let session = self
            .session
            .lock()
            .map_err(|_| Error::Channel("session lock poisoned".into()))?;

        let mut channel = session
            .channel_session()
            .map_err(|e| error::exec_error(&e))?;

        let result = drive_channel(&mut channel, command);

        // Release the channel regardless of how execution went. Close
        // failures here do not mask an execution error.
        let _ = channel.close();
        let _ = channel.wait_close();

        result
    }
}

fn drive_channel(channel: &mut ssh2::Channel, command: &str) -> Result<CommandOutput, Error> {
    channel.exec(command).map_err(|e| error::exec_error(&e))?;

    let mut stdout = String::new();
    channel
        .read_to_string(&mut stdout)
        .map_err(|e| Error::Transport(format!("reading stdout: {e}")))?;

    let mut stderr = String::new();
    channel
        .stderr()
        .read_to_string(&mut stderr)
        .map_err(|e| Error::Transport(format!("reading stderr: {e}")))?;

    trace!(
        stdout_len = stdout.len(),
        stderr_len = stderr.len(),
        "exec complete"
    );
    Ok(CommandOutput { stdout, stderr })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transport_timeouts() {
        let config = TransportConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.exec_timeout > Duration::from_secs(10));
    }

    #[test]
    fn resolve_rejects_garbage_hosts() {
        let connector = SshConnector::new(TransportConfig::default());
        let result = connector.resolve("this is not a hostname");
        assert!(result.is_err());
    }

    #[test]
    fn resolve_accepts_literal_addresses() {
        let connector = SshConnector::new(TransportConfig::default());
        let addr = match connector.resolve("127.0.0.1") {
            Ok(addr) => addr,
            Err(e) => panic!("loopback should resolve: {e}"),
        };
        assert_eq!(addr.port(), 22);
    }
}
