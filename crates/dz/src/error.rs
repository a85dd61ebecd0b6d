//! CLI error types.

use dz_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Live reload stopped after {reloads} reload(s), {failures} failed command(s): cannot reach {url}"
    )]
    GaveUp {
        /// Event-stream URL.
        url: String,
        /// Reloads performed before giving up.
        reloads: u32,
        /// Rebuild commands that did not succeed.
        failures: u32,
    },

    #[error("Rebuild command failed {failures} time(s)")]
    CommandFailed {
        /// Rebuild commands that did not succeed.
        failures: u32,
    },
}
