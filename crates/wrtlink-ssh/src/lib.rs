//! SSH transport layer for the wrtlink workspace.
//!
//! Exposes two object-safe seams that the rest of the workspace programs
//! against:
//!
//! - **[`Connect`]** — opens an authenticated session from [`Credentials`]
//!   and hands back an executor. Implemented for real hardware by
//!   [`SshConnector`].
//! - **[`Exec`]** — runs a single remote command on an established session
//!   and returns the raw captured [`CommandOutput`]. Implemented by
//!   [`SshSession`], which opens a dedicated exec channel per command and
//!   closes it on every exit path.
//!
//! Both traits are deliberately blocking: `libssh2` is a blocking library,
//! and `wrtlink-core` bridges calls onto the async runtime with
//! `spawn_blocking`. Interpretation of command output (status markers,
//! throughput lines) is entirely the caller's concern -- this crate only
//! moves bytes.

pub mod error;
pub mod exec;
pub mod session;

pub use error::Error;
pub use exec::{CommandOutput, Connect, Credentials, Exec};
pub use session::{SshConnector, SshSession, TransportConfig, SSH_PORT};
