//! Configuration management for dz.
//!
//! Parses `dz.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! `server.host` and `live_reload.endpoint` support `${VAR}` and
//! `${VAR:-default}`.

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use dz_ui::{
    LIVE_RELOAD_ENDPOINT_ATTRIBUTE, LiveReloadOptions, ReconnectPolicy, SIDEBAR_CLAMP_ATTRIBUTE,
    SIDEBAR_WIDTH_ATTRIBUTE, SidebarOptions,
};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override event-stream endpoint.
    pub endpoint: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "dz.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Docs server the live-reload client connects to.
    pub server: ServerConfig,
    /// Sidebar defaults.
    pub sidebar: SidebarConfig,
    /// Live-reload client settings.
    pub live_reload: LiveReloadConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        }
    }
}

/// Sidebar configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    /// Initial width in pixels.
    pub default_width: f64,
    /// Clamp dragged widths to the viewport.
    pub clamp_to_viewport: bool,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        let options = SidebarOptions::default();
        Self {
            default_width: options.default_width,
            clamp_to_viewport: options.clamp_to_viewport,
        }
    }
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Event-stream endpoint path.
    pub endpoint: String,
    /// Reconnection policy.
    pub reconnect: ReconnectConfig,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            endpoint: dz_ui::DEFAULT_ENDPOINT.to_owned(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Reconnection policy as written in TOML.
///
/// ```toml
/// reconnect = { policy = "backoff", initial_ms = 500, max_ms = 10000, factor = 2.0 }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ReconnectConfig {
    /// Never reconnect.
    None,
    /// Constant delay; a server `retry:` field takes precedence.
    Fixed {
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
        #[serde(default)]
        max_attempts: Option<u32>,
    },
    /// Exponential backoff.
    Backoff {
        #[serde(default = "default_initial_ms")]
        initial_ms: u64,
        #[serde(default = "default_max_ms")]
        max_ms: u64,
        #[serde(default = "default_factor")]
        factor: f64,
        #[serde(default)]
        max_attempts: Option<u32>,
    },
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self::Fixed {
            delay_ms: default_delay_ms(),
            max_attempts: None,
        }
    }
}

impl ReconnectConfig {
    /// Convert to the client's reconnect policy.
    #[must_use]
    pub fn to_policy(&self) -> ReconnectPolicy {
        match *self {
            Self::None => ReconnectPolicy::None,
            Self::Fixed {
                delay_ms,
                max_attempts,
            } => ReconnectPolicy::FixedDelay {
                delay: Duration::from_millis(delay_ms),
                max_attempts,
            },
            Self::Backoff {
                initial_ms,
                max_ms,
                factor,
                max_attempts,
            } => ReconnectPolicy::Backoff {
                initial: Duration::from_millis(initial_ms),
                max: Duration::from_millis(max_ms),
                factor,
                max_attempts,
            },
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn default_delay_ms() -> u64 {
    dz_ui::DEFAULT_RECONNECT_DELAY.as_millis() as u64
}

fn default_initial_ms() -> u64 {
    500
}

fn default_max_ms() -> u64 {
    10_000
}

fn default_factor() -> f64 {
    2.0
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`DZ_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `dz.toml` in current directory and parents,
    /// falling back to defaults.
    ///
    /// CLI settings are applied after loading and validated with the rest.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(endpoint) = &settings.endpoint {
            self.live_reload.endpoint.clone_from(endpoint);
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Base URL of the docs server (`http://host:port`).
    #[must_use]
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server.host, self.server.port)
    }

    /// Sidebar options for the page components.
    #[must_use]
    pub fn sidebar_options(&self) -> SidebarOptions {
        SidebarOptions {
            default_width: self.sidebar.default_width,
            clamp_to_viewport: self.sidebar.clamp_to_viewport,
        }
    }

    /// Live-reload client options.
    #[must_use]
    pub fn live_reload_options(&self) -> LiveReloadOptions {
        LiveReloadOptions {
            endpoint: self.live_reload.endpoint.clone(),
            reconnect: self.live_reload.reconnect.to_policy(),
        }
    }

    /// Document root attributes that carry this config to the page.
    ///
    /// Docs templates put these on `<html>`; the browser host reads them back
    /// with `PageOptions::from_dom`.
    #[must_use]
    pub fn page_attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            (SIDEBAR_WIDTH_ATTRIBUTE, self.sidebar.default_width.to_string()),
            (
                SIDEBAR_CLAMP_ATTRIBUTE,
                self.sidebar.clamp_to_viewport.to_string(),
            ),
            (
                LIVE_RELOAD_ENDPOINT_ATTRIBUTE,
                self.live_reload.endpoint.clone(),
            ),
        ]
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`] after CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_sidebar()?;
        self.validate_live_reload()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_sidebar(&self) -> Result<(), ConfigError> {
        let width = self.sidebar.default_width;
        if !width.is_finite() || width <= 0.0 {
            return Err(ConfigError::Validation(
                "sidebar.default_width must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_live_reload(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.live_reload.endpoint, "live_reload.endpoint")?;
        if !self.live_reload.endpoint.starts_with('/') {
            return Err(ConfigError::Validation(
                "live_reload.endpoint must start with /".to_owned(),
            ));
        }

        if let ReconnectConfig::Backoff {
            initial_ms,
            max_ms,
            factor,
            ..
        } = self.live_reload.reconnect
        {
            if !factor.is_finite() || factor < 1.0 {
                return Err(ConfigError::Validation(
                    "live_reload.reconnect.factor must be at least 1".to_owned(),
                ));
            }
            if initial_ms > max_ms {
                return Err(ConfigError::Validation(
                    "live_reload.reconnect.initial_ms cannot exceed max_ms".to_owned(),
                ));
            }
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.live_reload.endpoint =
            expand::expand_env(&self.live_reload.endpoint, "live_reload.endpoint")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.sidebar.default_width, 300.0);
        assert!(!config.sidebar.clamp_to_viewport);
        assert_eq!(config.live_reload.endpoint, "/ss-events");
        assert_eq!(
            config.live_reload.reconnect,
            ReconnectConfig::Fixed {
                delay_ms: 3000,
                max_attempts: None
            }
        );
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server_url(), "http://127.0.0.1:3000");
        assert_eq!(config.live_reload_options(), LiveReloadOptions::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000

[sidebar]
default_width = 260
clamp_to_viewport = true

[live_reload]
endpoint = "/events"
reconnect = { policy = "backoff", initial_ms = 250, max_ms = 8000, factor = 1.5, max_attempts = 10 }
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.server_url(), "http://0.0.0.0:9000");
        assert_eq!(
            config.sidebar_options(),
            SidebarOptions {
                default_width: 260.0,
                clamp_to_viewport: true,
            }
        );
        assert_eq!(
            config.live_reload_options(),
            LiveReloadOptions {
                endpoint: "/events".to_owned(),
                reconnect: ReconnectPolicy::Backoff {
                    initial: Duration::from_millis(250),
                    max: Duration::from_millis(8000),
                    factor: 1.5,
                    max_attempts: Some(10),
                },
            }
        );
    }

    #[test]
    fn test_parse_reconnect_none() {
        let toml = r#"
[live_reload]
reconnect = { policy = "none" }
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.live_reload.reconnect.to_policy(), ReconnectPolicy::None);
    }

    #[test]
    fn test_parse_reconnect_fixed_defaults() {
        let toml = r#"
[live_reload.reconnect]
policy = "fixed"
max_attempts = 3
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.live_reload.reconnect.to_policy(),
            ReconnectPolicy::FixedDelay {
                delay: Duration::from_millis(3000),
                max_attempts: Some(3),
            }
        );
    }

    #[test]
    fn test_parse_unknown_policy_fails() {
        let toml = r#"
[live_reload]
reconnect = { policy = "sometimes" }
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        let overrides = CliSettings {
            port: Some(9000),
            endpoint: Some("/events".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1"); // Unchanged
        assert_eq!(config.live_reload.endpoint, "/events");
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server_url(), "http://127.0.0.1:3000");
        assert_eq!(config.live_reload.endpoint, "/ss-events");
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_server_host_empty() {
        let mut config = Config::default();
        config.server.host = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.host"));
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_validate_sidebar_width() {
        let mut config = Config::default();
        config.sidebar.default_width = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sidebar.default_width"));

        config.sidebar.default_width = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_endpoint_must_be_path() {
        let mut config = Config::default();
        config.live_reload.endpoint = "ss-events".to_owned();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("live_reload.endpoint"));
    }

    #[test]
    fn test_validate_backoff() {
        let mut config = Config::default();
        config.live_reload.reconnect = ReconnectConfig::Backoff {
            initial_ms: 100,
            max_ms: 1000,
            factor: 0.5,
            max_attempts: None,
        };
        assert!(config.validate().unwrap_err().to_string().contains("factor"));

        config.live_reload.reconnect = ReconnectConfig::Backoff {
            initial_ms: 2000,
            max_ms: 1000,
            factor: 2.0,
            max_attempts: None,
        };
        assert!(config.validate().unwrap_err().to_string().contains("initial_ms"));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dz.toml");
        std::fs::write(&path, "[server]\nport = 4000\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dz.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_validates_after_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dz.toml");
        std::fs::write(&path, "").unwrap();
        let overrides = CliSettings {
            port: Some(0),
            ..Default::default()
        };

        let err = Config::load(Some(&path), Some(&overrides)).unwrap_err();

        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_load_expands_env_vars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dz.toml");
        std::fs::write(
            &path,
            "[server]\nhost = \"${DZ_TEST_LOAD_HOST:-localhost}\"\n",
        )
        .unwrap();
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("DZ_TEST_LOAD_HOST");
        }

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.server.host, "localhost");
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("docs").join("guide");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("dz.toml"), "").unwrap();

        let found = Config::discover_from(&nested);

        assert_eq!(found, Some(dir.path().join("dz.toml")));
    }

    #[test]
    fn test_page_attributes_default() {
        assert_eq!(
            Config::default().page_attributes(),
            vec![
                ("data-sidebar-width", "300".to_owned()),
                ("data-sidebar-clamp", "false".to_owned()),
                ("data-live-reload-endpoint", "/ss-events".to_owned()),
            ]
        );
    }

    #[test]
    fn test_page_attributes_read_back_by_page() {
        let config: Config = toml::from_str(
            "[sidebar]\ndefault_width = 262.5\nclamp_to_viewport = true\n\n[live_reload]\nendpoint = \"/events\"\n",
        )
        .unwrap();
        let dom = config
            .page_attributes()
            .into_iter()
            .fold(dz_ui::mock::MockDom::new(), |dom, (name, value)| {
                dom.with_root_attribute(name, value)
            });

        let options = dz_ui::PageOptions::from_dom(&dom);

        assert_eq!(options.sidebar, config.sidebar_options());
        assert_eq!(options.live_reload.endpoint, "/events");
    }
}
