use thiserror::Error;

/// Top-level error type for the `wrtlink-core` crate.
///
/// `Connection` means the link is (now) down -- recoverable only by a fresh
/// connect attempt. `Command` is scoped to the one operation that hit it and
/// never tears the session down by itself.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The operation requires a connected link.
    #[error("not connected")]
    NotConnected,

    /// Session establishment failed or the transport died mid-operation.
    #[error("connection failed: {reason}")]
    Connection { reason: String },

    /// A remote command reported failure without affecting the session.
    #[error("remote command failed: {message}")]
    Command { message: String },
}

impl CoreError {
    /// Map an executor error, preserving the transport/command split.
    pub(crate) fn from_exec(err: &wrtlink_ssh::Error) -> Self {
        if err.is_transport() {
            Self::Connection {
                reason: err.to_string(),
            }
        } else {
            Self::Command {
                message: err.to_string(),
            }
        }
    }
}
