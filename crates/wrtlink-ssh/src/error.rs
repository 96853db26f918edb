use thiserror::Error;

// libssh2 session error codes that indicate the underlying socket is gone
// (as opposed to a failure scoped to one exec channel).
const SOCKET_SEND: i32 = -7;
const SOCKET_TIMEOUT_BLOCKING: i32 = -9;
const SOCKET_DISCONNECT: i32 = -13;
const SOCKET_TIMEOUT: i32 = -30;
const SOCKET_RECV: i32 = -43;

const AUTH_PASSWORD_EXPIRED: i32 = -16;
const AUTH_FAILED: i32 = -18;

/// Top-level error type for the `wrtlink-ssh` crate.
///
/// The split between [`Transport`](Error::Transport) and
/// [`Channel`](Error::Channel) is load-bearing: a transport fault means the
/// session socket is dead and the owner must tear the link down, while a
/// channel fault is scoped to the one command that hit it.
#[derive(Debug, Error)]
pub enum Error {
    /// Password rejected or expired.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// Hostname did not resolve to any address.
    #[error("cannot resolve host: {host}")]
    Resolve { host: String },

    /// Socket-level fault on the session (connect refused, reset, timeout).
    #[error("transport fault: {0}")]
    Transport(String),

    /// The exec channel could not be opened or driven.
    #[error("exec channel error: {0}")]
    Channel(String),
}

impl Error {
    /// Returns `true` if the session socket should be considered dead.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Resolve { .. })
    }
}

pub(crate) fn is_socket_code(code: i32) -> bool {
    matches!(
        code,
        SOCKET_SEND | SOCKET_TIMEOUT_BLOCKING | SOCKET_DISCONNECT | SOCKET_TIMEOUT | SOCKET_RECV
    )
}

pub(crate) fn is_auth_code(code: i32) -> bool {
    matches!(code, AUTH_PASSWORD_EXPIRED | AUTH_FAILED)
}

/// Map an `ssh2` error raised during session establishment.
pub(crate) fn connect_error(err: &ssh2::Error) -> Error {
    match err.code() {
        ssh2::ErrorCode::Session(c) if is_auth_code(c) => Error::Authentication {
            message: err.message().to_owned(),
        },
        _ => Error::Transport(err.message().to_owned()),
    }
}

/// Map an `ssh2` error raised while driving an exec channel.
pub(crate) fn exec_error(err: &ssh2::Error) -> Error {
    match err.code() {
        ssh2::ErrorCode::Session(c) if is_socket_code(c) => {
            Error::Transport(err.message().to_owned())
        }
        _ => Error::Channel(err.message().to_owned()),
    }
}
