//! `wrtlink toggle` -- flip the service and report the confirmed outcome.

use wrtlink_core::LinkManager;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (config, connector) = super::link_parts(global)?;
    let color = output::should_color(&global.color);

    let confirmed = LinkManager::oneshot(config, connector, |mgr| async move {
        let printer = super::spawn_notice_printer(&mgr, color);

        // Toggle against observed state, not a guess: wait for the first
        // probe to land before choosing a direction. Bounded in case the
        // link dies right after connecting.
        let mut checked = mgr.subscribe_last_checked();
        if checked.borrow_and_update().is_none() {
            let budget = mgr.config().poll_interval * 2;
            let _ = tokio::time::timeout(budget, checked.changed()).await;
        }

        let outcome = mgr.toggle().await;
        printer.abort();
        outcome
    })
    .await?;

    println!("service {confirmed}");
    Ok(())
}
