//! `wrtlink config` -- show where credentials are read from.

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let path = match &global.credentials {
        Some(path) => path.clone(),
        None => wrtlink_config::default_path().map_err(CliError::Config)?,
    };
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist -- create it with host/username/password fields)");
    }
    Ok(())
}
