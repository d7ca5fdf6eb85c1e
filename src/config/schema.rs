/// Configuration schema and defaults for cargaboard.
///
/// Sections: `[api]`, `[render]`, `[poll]`, `[drivers]`, `[server]` and
/// `[logging]`. Every field has a built-in default; files only need the
/// values they override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration, as read from `~/.cargaboard/config.toml` and
/// `.cargaboard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    pub render: RenderConfig,
    pub poll: PollConfig,
    pub drivers: DriversConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Statistics backend connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Origin of the backend; endpoints live under `/api/stats`.
    pub base_url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
    /// Where the session cookies are kept between runs. `~` is expanded.
    pub session_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 10_000,
            session_path: "~/.cargaboard/session.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [render]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Device pixel ratio used to size canvas backing stores.
    pub device_pixel_ratio: f64,
    /// Directory that `--out` exports default to.
    pub output_dir: String,
    /// Width of a chart card in CSS pixels; chart sizes derive from it.
    pub width: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            output_dir: "charts".to_string(),
            width: 960.0,
        }
    }
}

// ---------------------------------------------------------------------------
// [poll]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between background refreshes of a page.
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

// ---------------------------------------------------------------------------
// [drivers]
// ---------------------------------------------------------------------------

/// Drivers and users page parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriversConfig {
    /// Driver cards per page.
    pub page_size: usize,
    /// Number of drivers requested for the ranking chart.
    pub ranking_limit: u32,
    /// `threshold` sent with the drivers summary request.
    pub alert_threshold: f64,
}

impl Default for DriversConfig {
    fn default() -> Self {
        Self {
            page_size: 12,
            ranking_limit: 10,
            alert_threshold: 2.5,
        }
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Local dashboard server (`cargaboard serve`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:9747".to_string(),
            open_browser: false,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether API calls are appended to the fetch log.
    pub enabled: bool,
    /// Path to the fetch log. `~` is expanded to the home directory.
    pub path: String,
    /// Console diagnostics level when `CARGABOARD_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.cargaboard/fetch-log.jsonl".to_string(),
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> std::path::PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    std::path::PathBuf::from(path)
}

impl DashboardConfig {
    /// Annotated default config written by `cargaboard config init`.
    pub fn default_toml() -> String {
        r#"# cargaboard configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (CARGABOARD_*)
#   2. Project config (.cargaboard.toml in current directory)
#   3. User global config (~/.cargaboard/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://localhost:8000"
timeout_ms = 10000
session_path = "~/.cargaboard/session.json"

[render]
device_pixel_ratio = 1.0
output_dir = "charts"                 # Default target of --out
width = 960.0                         # Chart card width in CSS pixels

[poll]
interval_secs = 60

[drivers]
page_size = 12
ranking_limit = 10
alert_threshold = 2.5

[server]
address = "127.0.0.1:9747"
open_browser = false

[logging]
enabled = true
path = "~/.cargaboard/fetch-log.jsonl"
level = "warn"                        # Overridden by CARGABOARD_LOG
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
