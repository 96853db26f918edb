//! Clap derive structures for the `wrtlink` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use wrtlink_core::SpeedTestMode;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wrtlink -- administer one OpenWrt service over a persistent SSH link
#[derive(Debug, Parser)]
#[command(
    name = "wrtlink",
    version,
    about = "Watch, toggle, and measure a remote OpenWrt service",
    long_about = "Maintains an administrative SSH link to a single OpenWrt host,\n\
        observes the openclash service, mediates toggles against the observed\n\
        state, and runs bracketed iperf3 speed tests.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the credentials file (host/username/password JSON)
    #[arg(long, short = 'c', env = "WRTLINK_CREDENTIALS", global = true)]
    pub credentials: Option<PathBuf>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Hold the link open and stream status notices
    Watch(WatchArgs),

    /// Flip the service to the opposite of its last observed state
    Toggle,

    /// Run a bracketed throughput/latency measurement
    Speedtest(SpeedtestArgs),

    /// Show the credentials file location
    Config,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after the first status report instead of watching
    #[arg(long)]
    pub once: bool,
}

#[derive(Debug, Args)]
pub struct SpeedtestArgs {
    /// Measurement protocol
    #[arg(long, value_enum, default_value = "tcp")]
    pub mode: ModeArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Tcp,
    Udp,
}

impl From<ModeArg> for SpeedTestMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Tcp => Self::Tcp,
            ModeArg::Udp => Self::Udp,
        }
    }
}
