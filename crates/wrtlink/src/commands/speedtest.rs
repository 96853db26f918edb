//! `wrtlink speedtest` -- run one bracketed measurement and print the result.

use wrtlink_core::{LinkManager, SpeedTestMode};

use crate::cli::{GlobalOpts, SpeedtestArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &SpeedtestArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (config, connector) = super::link_parts(global)?;
    let color = output::should_color(&global.color);
    let mode = SpeedTestMode::from(args.mode);

    let result = LinkManager::oneshot(config, connector, |mgr| async move {
        let printer = super::spawn_notice_printer(&mgr, color);
        let outcome = mgr.run_speed_test(mode).await;
        printer.abort();
        outcome
    })
    .await?;

    println!("{mode}: {}", result.summary());
    Ok(())
}
