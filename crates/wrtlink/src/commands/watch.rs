//! `wrtlink watch` -- hold the link open and stream status notices.

use tokio::sync::mpsc;

use wrtlink_core::{LinkManager, NetworkEvent};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (config, connector) = super::link_parts(global)?;
    let mgr = LinkManager::new(config, connector);

    if args.once {
        return once(&mgr).await;
    }

    let color = output::should_color(&global.color);
    let printer = super::spawn_notice_printer(&mgr, color);

    // Seed the consumer with an initial availability event. A platform
    // network monitor, where present, feeds the same channel.
    let (tx, rx) = mpsc::channel(8);
    let consumer = {
        let mgr = mgr.clone();
        tokio::spawn(async move { mgr.run_network_events(rx).await })
    };
    let _ = tx.send(NetworkEvent::LinkAvailable).await;

    let _ = tokio::signal::ctrl_c().await;
    tracing::debug!("interrupt received, shutting down");

    mgr.shutdown().await;
    drop(tx);
    let _ = consumer.await;
    drop(mgr);
    let _ = printer.await;
    Ok(())
}

/// Connect, wait for the first completed probe, report, and leave.
async fn once(mgr: &LinkManager) -> Result<(), CliError> {
    mgr.connect().await?;

    let mut checked = mgr.subscribe_last_checked();
    if checked.borrow_and_update().is_none() {
        let budget = mgr.config().poll_interval * 2;
        let _ = tokio::time::timeout(budget, checked.changed()).await;
    }
    let stamp = checked
        .borrow()
        .map_or_else(|| "-".to_string(), |at| at.format("%H:%M:%S").to_string());
    println!("service {} (checked {stamp})", mgr.service_status());

    mgr.shutdown().await;
    Ok(())
}
