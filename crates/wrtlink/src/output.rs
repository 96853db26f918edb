//! Notice rendering: timestamps, severity colors, terminal detection.

use std::io::{self, IsTerminal};

use owo_colors::OwoColorize;

use wrtlink_core::{Severity, StatusNotice};

use crate::cli::ColorMode;

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Render one notice as a log line: `HH:MM:SS - text`, colored by severity.
pub fn render_notice(notice: &StatusNotice, color: bool) -> String {
    let line = format!("{} - {}", notice.refreshed_at.format("%H:%M:%S"), notice.text);
    if !color {
        return line;
    }
    match notice.severity {
        Severity::Info => line,
        Severity::Success => line.green().to_string(),
        Severity::Warning => line.yellow().to_string(),
        Severity::Error => line.red().to_string(),
        Severity::Pending => line.cyan().to_string(),
    }
}
