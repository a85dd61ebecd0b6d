//! Colored terminal output for the listener.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Writes to stderr so the spawned command owns stdout.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Startup banner with the event-stream URL.
    pub(crate) fn listening(&self, url: &str) {
        let url = self.cyan_bold.apply_to(url);
        let _ = self.term.write_line(&format!("Listening for rebuilds on {url}"));
    }

    /// Plain informational line.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// A rebuild event arrived (green).
    pub(crate) fn reloaded(&self, count: u32) {
        let msg = format!("Rebuild #{count} received");
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// The reload command could not run or failed (yellow).
    pub(crate) fn command_failed(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Fatal error (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }
}
