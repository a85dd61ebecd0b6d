//! `dz listen` command implementation.

use std::path::PathBuf;
use std::process::Command;

use clap::Args;
use dz_config::{CliSettings, Config};
use dz_sse::HttpEventSource;
use dz_ui::{
    EventSource, LiveReload, LiveReloadOptions, Navigator, Outcome, Sleep, ThreadSleep,
    run_blocking,
};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the listen command.
#[derive(Args)]
pub(crate) struct ListenArgs {
    /// Path to configuration file (default: auto-discover dz.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Docs server host (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Docs server port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Event-stream endpoint path (overrides config).
    #[arg(long)]
    endpoint: Option<String>,

    /// Exit after the first rebuild.
    #[arg(long)]
    once: bool,

    /// Enable verbose output (connection lifecycle logs).
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to run on every rebuild.
    #[arg(last = true)]
    command: Vec<String>,
}

impl ListenArgs {
    /// Execute the listen command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the reconnect policy gives
    /// up on the server, or a `--once` run's command failed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        let options = config.live_reload_options();
        let url = format!("{}{}", config.server_url(), options.endpoint);

        output.listening(&url);
        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }
        if !self.command.is_empty() {
            output.info(&format!("On rebuild: {}", self.command.join(" ")));
        }

        let mut source = HttpEventSource::new(&config.server_url());
        let mut navigator = CommandNavigator::new(self.command, &output);
        let (reloads, outcome) = follow(
            &options,
            &mut source,
            &mut navigator,
            &mut ThreadSleep,
            self.once,
        );

        finish(outcome, url, reloads, navigator.failures)
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.port,
            endpoint: self.endpoint.clone(),
        }
    }
}

/// Run live-reload clients back to back, one per simulated page load.
///
/// Returns the number of reloads and how the last client ended. Without
/// `once`, only a policy giving up stops the loop.
fn follow<S, N, Z>(
    options: &LiveReloadOptions,
    source: &mut S,
    navigator: &mut N,
    sleeper: &mut Z,
    once: bool,
) -> (u32, Outcome)
where
    S: EventSource,
    N: Navigator,
    Z: Sleep,
{
    let mut reloads = 0;
    loop {
        let mut client = LiveReload::new(options.clone());
        match run_blocking(&mut client, source, navigator, sleeper) {
            Outcome::Reloaded => {
                reloads += 1;
                if once {
                    return (reloads, Outcome::Reloaded);
                }
            }
            Outcome::GaveUp => return (reloads, Outcome::GaveUp),
        }
    }
}

/// Map how following ended to the command result.
fn finish(outcome: Outcome, url: String, reloads: u32, failures: u32) -> Result<(), CliError> {
    match outcome {
        Outcome::GaveUp => Err(CliError::GaveUp {
            url,
            reloads,
            failures,
        }),
        Outcome::Reloaded if failures > 0 => Err(CliError::CommandFailed { failures }),
        Outcome::Reloaded => Ok(()),
    }
}

/// Navigator that runs a command instead of reloading a page.
struct CommandNavigator<'a> {
    command: Vec<String>,
    output: &'a Output,
    reloads: u32,
    failures: u32,
}

impl<'a> CommandNavigator<'a> {
    fn new(command: Vec<String>, output: &'a Output) -> Self {
        Self {
            command,
            output,
            reloads: 0,
            failures: 0,
        }
    }
}

impl Navigator for CommandNavigator<'_> {
    fn reload(&mut self) {
        self.reloads += 1;
        self.output.reloaded(self.reloads);

        let Some((program, args)) = self.command.split_first() else {
            return;
        };
        match Command::new(program).args(args).status() {
            Ok(status) if status.success() => {
                tracing::info!(%program, "Rebuild command finished");
            }
            Ok(status) => {
                self.failures += 1;
                self.output
                    .command_failed(&format!("Command `{program}` exited with {status}"));
            }
            Err(e) => {
                self.failures += 1;
                self.output
                    .command_failed(&format!("Failed to run `{program}`: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use dz_ui::mock::{MockEventSource, RecordingNavigator, RecordingSleep};
    use dz_ui::{Frame, MessageEvent, ReconnectPolicy};
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ListenArgs,
    }

    fn rebuilt() -> Vec<Result<Frame, dz_ui::TransportError>> {
        vec![Ok(Frame::Message(MessageEvent::new("rebuilt")))]
    }

    fn no_reconnect() -> LiveReloadOptions {
        LiveReloadOptions {
            reconnect: ReconnectPolicy::None,
            ..LiveReloadOptions::default()
        }
    }

    #[test]
    fn test_parse_args_with_command() {
        let cli = TestCli::try_parse_from([
            "dz", "--port", "4000", "--endpoint", "/events", "--once", "--", "make", "docs",
        ])
        .unwrap();

        let settings = cli.args.cli_settings();
        assert_eq!(settings.port, Some(4000));
        assert_eq!(settings.endpoint.as_deref(), Some("/events"));
        assert!(settings.host.is_none());
        assert!(cli.args.once);
        assert_eq!(cli.args.command, vec!["make", "docs"]);
    }

    #[test]
    fn test_parse_args_defaults() {
        let cli = TestCli::try_parse_from(["dz"]).unwrap();

        assert!(!cli.args.once);
        assert!(!cli.args.verbose);
        assert!(cli.args.command.is_empty());
        assert!(cli.args.config.is_none());
    }

    #[test]
    fn test_follow_once_stops_after_first_reload() {
        let mut source = MockEventSource::new()
            .with_connection(rebuilt())
            .with_connection(rebuilt());
        let mut navigator = RecordingNavigator::default();

        let result = follow(
            &no_reconnect(),
            &mut source,
            &mut navigator,
            &mut RecordingSleep::default(),
            true,
        );

        assert_eq!(result, (1, Outcome::Reloaded));
        assert_eq!(source.connects().len(), 1);
        assert_eq!(navigator.reloads(), 1);
    }

    #[test]
    fn test_follow_starts_fresh_client_per_reload() {
        let mut source = MockEventSource::new()
            .with_connection(rebuilt())
            .with_connection(rebuilt());
        let mut navigator = RecordingNavigator::default();

        let result = follow(
            &no_reconnect(),
            &mut source,
            &mut navigator,
            &mut RecordingSleep::default(),
            false,
        );

        assert_eq!(result, (2, Outcome::GaveUp));
        assert_eq!(source.connects(), vec!["/ss-events"; 3]);
        assert_eq!(navigator.reloads(), 2);
    }

    #[test]
    fn test_finish_once_with_successful_command() {
        assert!(finish(Outcome::Reloaded, "http://x/ss-events".to_owned(), 1, 0).is_ok());
    }

    #[test]
    fn test_finish_once_with_failed_command() {
        let output = Output::new();
        let mut navigator =
            CommandNavigator::new(vec!["dz-test-no-such-program".to_owned()], &output);
        navigator.reload();

        let err = finish(
            Outcome::Reloaded,
            "http://x/ss-events".to_owned(),
            navigator.reloads,
            navigator.failures,
        )
        .unwrap_err();

        assert!(matches!(err, CliError::CommandFailed { failures: 1 }));
    }

    #[test]
    fn test_finish_gave_up_reports_failures() {
        let err = finish(Outcome::GaveUp, "http://x/ss-events".to_owned(), 3, 2).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Live reload stopped after 3 reload(s), 2 failed command(s): cannot reach http://x/ss-events"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_command_navigator_runs_command() {
        let output = Output::new();
        let mut navigator = CommandNavigator::new(vec!["true".to_owned()], &output);

        navigator.reload();

        assert_eq!(navigator.reloads, 1);
        assert_eq!(navigator.failures, 0);
    }

    #[test]
    fn test_command_navigator_reports_missing_program() {
        let output = Output::new();
        let mut navigator =
            CommandNavigator::new(vec!["dz-test-no-such-program".to_owned()], &output);

        navigator.reload();

        assert_eq!(navigator.reloads, 1);
        assert_eq!(navigator.failures, 1);
    }

    #[test]
    fn test_command_navigator_without_command() {
        let output = Output::new();
        let mut navigator = CommandNavigator::new(Vec::new(), &output);

        navigator.reload();
        navigator.reload();

        assert_eq!(navigator.reloads, 2);
        assert_eq!(navigator.failures, 0);
    }
}
