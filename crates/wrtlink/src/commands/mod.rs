//! Command handlers, one module per subcommand.

pub mod config_cmd;
pub mod speedtest;
pub mod toggle;
pub mod watch;

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use wrtlink_core::{Connect, LinkConfig, LinkManager};
use wrtlink_ssh::{SshConnector, TransportConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn dispatch(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match command {
        Command::Watch(args) => watch::handle(&args, global).await,
        Command::Toggle => toggle::handle(global).await,
        Command::Speedtest(args) => speedtest::handle(&args, global).await,
        Command::Config => config_cmd::handle(global),
    }
}

/// Load credentials and build the link configuration plus the real
/// connector. Config failures block everything downstream.
pub(crate) fn link_parts(global: &GlobalOpts) -> Result<(LinkConfig, Arc<dyn Connect>), CliError> {
    let credentials = wrtlink_config::load(global.credentials.as_deref())?;
    let config = LinkConfig::new(credentials);
    let connector: Arc<dyn Connect> = Arc::new(SshConnector::new(TransportConfig::default()));
    Ok((config, connector))
}

/// Print the notice stream until every sender is gone.
pub(crate) fn spawn_notice_printer(mgr: &LinkManager, color: bool) -> JoinHandle<()> {
    let mut rx = mgr.notices();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notice) => println!("{}", output::render_notice(&notice, color)),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
