//! `dz attributes` command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use dz_config::Config;

use crate::error::CliError;

/// Arguments for the attributes command.
#[derive(Args)]
pub(crate) struct AttributesArgs {
    /// Path to configuration file (default: auto-discover dz.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl AttributesArgs {
    /// Print the `<html>` attributes for the configured page components.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or stdout cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        writeln!(io::stdout(), "{}", render(&config.page_attributes()))?;
        Ok(())
    }
}

/// Render attributes as they appear inside an HTML start tag.
fn render(attributes: &[(&str, String)]) -> String {
    attributes
        .iter()
        .map(|(name, value)| format!("{name}=\"{}\"", escape(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
