use miette::Diagnostic;
use thiserror::Error;

/// CLI-level errors with exit codes in the sysexits style.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] wrtlink_config::ConfigError),

    #[error(transparent)]
    Core(#[from] wrtlink_core::CoreError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78, // EX_CONFIG
            Self::Core(wrtlink_core::CoreError::NotConnected | wrtlink_core::CoreError::Connection { .. }) => 69, // EX_UNAVAILABLE
            Self::Core(_) => 1,
        }
    }
}
