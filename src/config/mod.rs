//! Configuration management.
//!
//! Configuration is resolved in layers: built-in defaults, then an optional
//! TOML file, then `FRAGMIND_*` environment variables.
//!
//! # File Lookup
//!
//! 1. An explicit path (the `--config` flag)
//! 2. `FRAGMIND_CONFIG_PATH`
//! 3. Platform config dir (`~/Library/Application Support/fragmind/` on macOS)
//! 4. XDG-style `~/.config/fragmind/config.toml`
//!
//! # Example
//!
//! ```toml
//! data_dir = "~/.local/share/fragmind"
//!
//! [endpoint]
//! url = "https://chat.example.com/api/v1/chat/completions"
//! token = "${FRAGMIND_CHAT_TOKEN}"
//! include_preamble = true
//!
//! [panel]
//! width = 450
//! viewport_width = 1280
//! viewport_height = 720
//! ```

use crate::models::{PanelGeometry, Point, Size};
use crate::observability::LogFormat;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reply appended to the transcript when the endpoint fails.
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Sorry, the service is temporarily unavailable. Please try again later.";

/// Main configuration for fragmind.
#[derive(Debug, Clone, Serialize)]
pub struct FragmindConfig {
    /// Directory holding `fragments.json`.
    pub data_dir: PathBuf,
    /// Dialogue endpoint settings.
    pub endpoint: EndpointConfig,
    /// Graph layout settings.
    pub graph: GraphConfig,
    /// Floating panel settings.
    pub panel: PanelConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Dialogue endpoint configuration.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointConfig {
    /// Chat endpoint URL.
    pub url: String,
    /// Bearer token (supports `${VAR}` references).
    pub token: Option<String>,
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
    /// Retries for timed-out or unreachable requests.
    pub max_retries: u32,
    /// Backoff between retries in milliseconds.
    pub retry_backoff_ms: u64,
    /// Consecutive failures before the circuit opens.
    pub breaker_failure_threshold: u32,
    /// How long the circuit stays open before a trial call.
    pub breaker_reset_ms: u64,
    /// Trial calls allowed while half-open.
    pub breaker_half_open_max_calls: u32,
    /// Whether the context preamble is prepended to the message content.
    pub include_preamble: bool,
    /// Reply used when a turn fails.
    pub fallback_reply: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/api/chat".to_string(),
            token: None,
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
            max_retries: 0,
            retry_backoff_ms: 100,
            breaker_failure_threshold: 3,
            breaker_reset_ms: 30_000,
            breaker_half_open_max_calls: 1,
            include_preamble: false,
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
        }
    }
}

/// Graph layout configuration.
#[derive(Debug, Clone, Serialize)]
pub struct GraphConfig {
    /// Nodes per grid row.
    pub columns: usize,
    /// Horizontal grid pitch.
    pub column_pitch: f64,
    /// Vertical grid pitch.
    pub row_pitch: f64,
    /// Maximum random offset per coordinate.
    pub jitter: f64,
    /// Fixed jitter seed.
    pub seed: Option<u64>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            columns: 5,
            column_pitch: 300.0,
            row_pitch: 200.0,
            jitter: 100.0,
            seed: None,
        }
    }
}

/// Floating panel configuration.
#[derive(Debug, Clone, Serialize)]
pub struct PanelConfig {
    /// Initial top-left corner.
    pub position: Point,
    /// Initial size.
    pub size: Size,
    /// Smallest size.
    pub min_size: Size,
    /// Largest size.
    pub max_size: Size,
    /// Size while minimized.
    pub minimized_size: Size,
    /// Viewport the panel is clamped into.
    pub viewport: Size,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            position: Point::new(20.0, 20.0),
            size: Size::new(400.0, 500.0),
            min_size: Size::new(300.0, 400.0),
            max_size: Size::new(600.0, 700.0),
            minimized_size: Size::new(200.0, 60.0),
            viewport: Size::new(1920.0, 1080.0),
        }
    }
}

impl PanelConfig {
    /// Geometry a freshly opened panel starts with.
    #[must_use]
    pub const fn default_geometry(&self) -> PanelGeometry {
        PanelGeometry::new(self.position, self.size)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,
    /// Log file; stderr when absent.
    pub file: Option<PathBuf>,
    /// `EnvFilter` directive, e.g. `fragmind=debug`.
    pub filter: Option<String>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Endpoint section.
    pub endpoint: Option<ConfigFileEndpoint>,
    /// Graph section.
    pub graph: Option<ConfigFileGraph>,
    /// Panel section.
    pub panel: Option<ConfigFilePanel>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Endpoint section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFileEndpoint {
    /// URL.
    pub url: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
    /// Retries.
    pub max_retries: Option<u32>,
    /// Retry backoff.
    pub retry_backoff_ms: Option<u64>,
    /// Breaker threshold.
    pub breaker_failure_threshold: Option<u32>,
    /// Breaker reset.
    pub breaker_reset_ms: Option<u64>,
    /// Half-open trial calls.
    pub breaker_half_open_max_calls: Option<u32>,
    /// Prepend the preamble.
    pub include_preamble: Option<bool>,
    /// Fallback reply.
    pub fallback_reply: Option<String>,
}

/// Graph section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFileGraph {
    /// Columns.
    pub columns: Option<usize>,
    /// Column pitch.
    pub column_pitch: Option<f64>,
    /// Row pitch.
    pub row_pitch: Option<f64>,
    /// Jitter.
    pub jitter: Option<f64>,
    /// Seed.
    pub seed: Option<u64>,
}

/// Panel section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFilePanel {
    /// Initial x.
    pub x: Option<f64>,
    /// Initial y.
    pub y: Option<f64>,
    /// Initial width.
    pub width: Option<f64>,
    /// Initial height.
    pub height: Option<f64>,
    /// Minimum width.
    pub min_width: Option<f64>,
    /// Minimum height.
    pub min_height: Option<f64>,
    /// Maximum width.
    pub max_width: Option<f64>,
    /// Maximum height.
    pub max_height: Option<f64>,
    /// Minimized width.
    pub minimized_width: Option<f64>,
    /// Minimized height.
    pub minimized_height: Option<f64>,
    /// Viewport width.
    pub viewport_width: Option<f64>,
    /// Viewport height.
    pub viewport_height: Option<f64>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
}

impl Default for FragmindConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            endpoint: EndpointConfig::default(),
            graph: GraphConfig::default(),
            panel: PanelConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".fragmind"),
        |dirs| dirs.data_dir().join("fragmind"),
    )
}

impl FragmindConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves configuration from `path`, the environment, or defaults.
    ///
    /// Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly requested file (the `path` argument
    /// or `FRAGMIND_CONFIG_PATH`) cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = path {
            Self::load_from_file(path)?
        } else if let Some(env_path) = std::env::var_os("FRAGMIND_CONFIG_PATH") {
            Self::load_from_file(Path::new(&env_path))?
        } else {
            Self::load_default()
        };
        Ok(config.with_env_overrides())
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::parse(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn parse(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Returns default configuration if no readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("fragmind").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("fragmind")
                .join("config.toml"),
        ];
        for candidate in candidates {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %candidate.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `FragmindConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = expand_home(&data_dir);
        }
        if let Some(endpoint) = file.endpoint {
            config.endpoint.apply(endpoint);
        }
        if let Some(graph) = file.graph {
            config.graph.apply(graph);
        }
        if let Some(panel) = file.panel {
            config.panel.apply(&panel);
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = format.parse()?;
            }
            config.logging.file = logging.file.map(|f| expand_home(&f));
            config.logging.filter = logging.filter;
        }

        Ok(config)
    }

    /// Applies `FRAGMIND_*` environment variable overrides.
    ///
    /// Unparsable numeric values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("FRAGMIND_DATA_DIR") {
            self.data_dir = expand_home(&v);
        }
        if let Ok(v) = std::env::var("FRAGMIND_CHAT_URL") {
            self.endpoint.url = v;
        }
        if let Ok(v) = std::env::var("FRAGMIND_CHAT_TOKEN") {
            self.endpoint.token = Some(v);
        }
        if let Ok(v) = std::env::var("FRAGMIND_CHAT_TIMEOUT_MS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.endpoint.timeout_ms = parsed;
            }
        }
        if let Ok(v) = std::env::var("FRAGMIND_CHAT_MAX_RETRIES") {
            if let Ok(parsed) = v.parse::<u32>() {
                self.endpoint.max_retries = parsed;
            }
        }
        if let Ok(v) = std::env::var("FRAGMIND_LOG_FORMAT") {
            if let Ok(format) = v.parse() {
                self.logging.format = format;
            }
        }
        if let Ok(v) = std::env::var("FRAGMIND_LOG_FILE") {
            self.logging.file = Some(expand_home(&v));
        }
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Path of the fragment store file.
    #[must_use]
    pub fn fragments_path(&self) -> PathBuf {
        self.data_dir.join("fragments.json")
    }

    /// Endpoint token with `${VAR}` references expanded.
    #[must_use]
    pub fn resolved_token(&self) -> Option<String> {
        self.endpoint
            .token
            .as_deref()
            .map(expand_env_vars)
            .filter(|t| !t.trim().is_empty())
    }
}

impl EndpointConfig {
    fn apply(&mut self, file: ConfigFileEndpoint) {
        if let Some(url) = file.url {
            self.url = expand_env_vars(&url);
        }
        if file.token.is_some() {
            self.token = file.token;
        }
        if let Some(v) = file.timeout_ms {
            self.timeout_ms = v;
        }
        if let Some(v) = file.connect_timeout_ms {
            self.connect_timeout_ms = v;
        }
        if let Some(v) = file.max_retries {
            self.max_retries = v;
        }
        if let Some(v) = file.retry_backoff_ms {
            self.retry_backoff_ms = v;
        }
        if let Some(v) = file.breaker_failure_threshold {
            self.breaker_failure_threshold = v.max(1);
        }
        if let Some(v) = file.breaker_reset_ms {
            self.breaker_reset_ms = v;
        }
        if let Some(v) = file.breaker_half_open_max_calls {
            self.breaker_half_open_max_calls = v.max(1);
        }
        if let Some(v) = file.include_preamble {
            self.include_preamble = v;
        }
        if let Some(v) = file.fallback_reply {
            self.fallback_reply = v;
        }
    }
}

impl GraphConfig {
    fn apply(&mut self, file: ConfigFileGraph) {
        if let Some(v) = file.columns {
            self.columns = v.max(1);
        }
        if let Some(v) = file.column_pitch {
            self.column_pitch = v;
        }
        if let Some(v) = file.row_pitch {
            self.row_pitch = v;
        }
        if let Some(v) = file.jitter {
            self.jitter = v.max(0.0);
        }
        if file.seed.is_some() {
            self.seed = file.seed;
        }
    }
}

impl PanelConfig {
    fn apply(&mut self, file: &ConfigFilePanel) {
        let set = |target: &mut f64, value: Option<f64>| {
            if let Some(v) = value {
                *target = v;
            }
        };
        set(&mut self.position.x, file.x);
        set(&mut self.position.y, file.y);
        set(&mut self.size.width, file.width);
        set(&mut self.size.height, file.height);
        set(&mut self.min_size.width, file.min_width);
        set(&mut self.min_size.height, file.min_height);
        set(&mut self.max_size.width, file.max_width);
        set(&mut self.max_size.height, file.max_height);
        set(&mut self.minimized_size.width, file.minimized_width);
        set(&mut self.minimized_size.height, file.minimized_height);
        set(&mut self.viewport.width, file.viewport_width);
        set(&mut self.viewport.height, file.viewport_height);
    }
}

/// Expands `${VAR}` references from the environment.
///
/// Unset variables expand to the empty string; an unterminated `${` is kept
/// literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        out.push_str(&std::env::var(&after[..end]).unwrap_or_default());
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_panel_constants() {
        let config = FragmindConfig::default();
        assert_eq!(config.panel.position, Point::new(20.0, 20.0));
        assert_eq!(config.panel.size, Size::new(400.0, 500.0));
        assert_eq!(config.panel.minimized_size, Size::new(200.0, 60.0));
        assert_eq!(config.graph.columns, 5);
        assert_eq!(config.endpoint.max_retries, 0);
        assert!(!config.endpoint.include_preamble);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = FragmindConfig::parse(
            r#"
            data_dir = "/tmp/fragmind-test"

            [endpoint]
            url = "https://chat.example.com/api"
            include_preamble = true
            breaker_failure_threshold = 0

            [graph]
            columns = 3
            seed = 9

            [panel]
            width = 450
            viewport_width = 1280.0

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/fragmind-test"));
        assert_eq!(config.endpoint.url, "https://chat.example.com/api");
        assert!(config.endpoint.include_preamble);
        assert_eq!(config.endpoint.breaker_failure_threshold, 1);
        assert_eq!(config.endpoint.timeout_ms, 30_000);
        assert_eq!(config.graph.columns, 3);
        assert_eq!(config.graph.seed, Some(9));
        assert!((config.panel.size.width - 450.0).abs() < f64::EPSILON);
        assert!((config.panel.size.height - 500.0).abs() < f64::EPSILON);
        assert!((config.panel.viewport.width - 1280.0).abs() < f64::EPSILON);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.fragments_path(), PathBuf::from("/tmp/fragmind-test/fragments.json"));
    }

    #[test]
    fn test_parse_rejects_bad_log_format() {
        let result = FragmindConfig::parse("[logging]\nformat = \"xml\"\n");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_parse_rejects_invalid_toml() {
        let result = FragmindConfig::parse("[endpoint\nurl = 1");
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }

    #[test]
    fn test_expand_env_vars_without_references() {
        assert_eq!(expand_env_vars("plain-token"), "plain-token");
        assert_eq!(expand_env_vars("broken ${UNTERMINATED"), "broken ${UNTERMINATED");
        assert_eq!(
            expand_env_vars("${FRAGMIND_TEST_SURELY_UNSET_VAR}-x"),
            "-x"
        );
    }

    #[test]
    fn test_expand_env_vars_reads_environment() {
        // PATH is set in every test environment.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env_vars("a:${PATH}"), format!("a:{path}"));
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let result = FragmindConfig::load_from_file(Path::new("/nonexistent/fragmind.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[graph]\njitter = -5.0\n").unwrap();
        let config = FragmindConfig::load_from_file(&path).unwrap();
        assert!(config.graph.jitter.abs() < f64::EPSILON);
    }
}
