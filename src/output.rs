//! # Terminal Output
//!
//! Presentation helpers shared by the CLI commands: colour detection and the
//! markers printed next to each workspace.
//!
//! Colour is decided once per invocation from the `--color` flag and the
//! usual environment conventions:
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colour when set, whatever its value
//! - `CLICOLOR=0` disables colour, `CLICOLOR_FORCE=1` forces it
//! - `TERM=dumb` disables colour
//!
//! ```rust,ignore
//! use fabric_promote::output::{marker, Marker, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Blueprint", marker(&out, Marker::Ok));
//! ```

use std::env;

use console::Style;

use crate::orchestrator::OutcomeStatus;

/// Whether styled output should be produced
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Build from the `--color` flag value: "always", "never" or "auto".
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Line markers used across commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Ok,
    Error,
    Warning,
    Skipped,
    Info,
}

impl Marker {
    fn plain(self) -> &'static str {
        match self {
            Marker::Ok => "[OK]",
            Marker::Error => "[ERR]",
            Marker::Warning => "[WARN]",
            Marker::Skipped => "[SKIP]",
            Marker::Info => "[INFO]",
        }
    }

    fn style(self) -> Style {
        match self {
            Marker::Ok => Style::new().green().bold(),
            Marker::Error => Style::new().red().bold(),
            Marker::Warning => Style::new().yellow().bold(),
            Marker::Skipped => Style::new().yellow(),
            Marker::Info => Style::new().cyan(),
        }
    }
}

impl From<&OutcomeStatus> for Marker {
    fn from(status: &OutcomeStatus) -> Self {
        match status {
            OutcomeStatus::Succeeded => Marker::Ok,
            OutcomeStatus::Failed => Marker::Error,
            OutcomeStatus::Skipped(_) => Marker::Skipped,
        }
    }
}

/// Render a marker, styled when colour is enabled
pub fn marker(config: &OutputConfig, marker: Marker) -> String {
    if config.use_color {
        marker.style().force_styling(true).apply_to(marker.plain()).to_string()
    } else {
        marker.plain().to_string()
    }
}

/// Short human label for an outcome status
pub fn status_label(status: &OutcomeStatus) -> String {
    match status {
        OutcomeStatus::Succeeded => "published".to_string(),
        OutcomeStatus::Failed => "failed".to_string(),
        OutcomeStatus::Skipped(reason) => format!("skipped ({})", reason),
    }
}
