// Executor seams shared by the real SSH session and test doubles.

use secrecy::SecretString;

use crate::error::Error;

/// Login material for one session attempt.
///
/// Immutable once loaded; the connection owner holds it for the lifetime of
/// the link. The secret never appears in `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub host: String,
    pub username: String,
    pub password: SecretString,
}

/// Raw captured output of one remote command.
///
/// Both streams are returned as-is. Whether a non-empty `stderr` means the
/// command failed is for the caller to decide -- BusyBox init scripts
/// routinely write status text to either stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Both streams joined for substring classification, stderr first so
    /// diagnostics lead when present.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stderr, self.stdout)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.trim().is_empty() && self.stderr.trim().is_empty()
    }
}

/// Runs one command on an established session.
///
/// Implementations must open a dedicated channel per call and release it on
/// every exit path -- callers may invoke this from several tasks over the
/// lifetime of a session, but never retain anything beyond the returned
/// output.
pub trait Exec: Send + Sync {
    fn run(&self, command: &str) -> Result<CommandOutput, Error>;
}

/// Opens an authenticated session from credentials.
///
/// Blocking by contract; callers bridge onto the async runtime themselves.
pub trait Connect: Send + Sync {
    fn open(&self, credentials: &Credentials) -> Result<Box<dyn Exec>, Error>;
}
