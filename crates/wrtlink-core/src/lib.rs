//! Link lifecycle and remote-service mediation for the wrtlink workspace.
//!
//! This crate owns the business logic between the SSH transport and the
//! presentation layer:
//!
//! - **[`LinkManager`]** — Central facade managing the full lifecycle:
//!   [`connect()`](LinkManager::connect) authenticates with a single
//!   in-flight guard and a fixed timeout, then binds a status poll task to
//!   the Connected state. [`disconnect_forced()`](LinkManager::disconnect_forced)
//!   tears everything down from any state.
//!   [`LinkManager::oneshot()`] provides a fire-and-forget mode for single
//!   CLI invocations.
//!
//! - **Status observation** — the poll task probes the remote service every
//!   few seconds, classifies raw init-script output
//!   ([`classify_status`](status::classify_status)), and reports through
//!   debounced `watch`/`broadcast` channels: observers hear about changes,
//!   not about every identical tick.
//!
//! - **Operations** ([`ops`]) — [`toggle()`](LinkManager::toggle) mediates a
//!   user flip against the last observed state with two-phase (optimistic,
//!   then confirmed) reporting;
//!   [`run_speed_test()`](LinkManager::run_speed_test) brackets an iperf3
//!   measurement with a guaranteed helper teardown.
//!
//! - **[`NetworkEvent`]** — inbound connectivity events; the manager is a
//!   pure consumer and forces teardown on loss.

pub mod config;
pub mod error;
pub mod link;
pub mod net;
pub mod notify;
pub mod ops;
pub mod remote;
pub mod status;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::LinkConfig;
pub use error::CoreError;
pub use link::{LinkManager, LinkState};
pub use net::NetworkEvent;
pub use notify::{Severity, StatusNotice};
pub use ops::speedtest::{SpeedTestMode, SpeedTestResult};
pub use status::ServiceStatus;

// Transport seams, re-exported so consumers depend on one crate.
pub use wrtlink_ssh::{CommandOutput, Connect, Credentials, Exec};
