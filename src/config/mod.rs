/// Configuration system for cargaboard.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::DashboardConfig::default()`]
/// 2. **User global config**: `~/.cargaboard/config.toml`
/// 3. **Project local config**: `.cargaboard.toml` in the current directory
/// 4. **Environment variables**: `CARGABOARD_*` overrides (highest precedence)
///
/// Later layers override earlier ones. Missing sections in a TOML file fall
/// back to the built-in defaults.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::DashboardConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> DashboardConfig {
    let mut config = DashboardConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }
    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Load a TOML config file, ignoring missing or malformed files.
fn load_toml_file(path: Option<PathBuf>) -> Option<DashboardConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.cargaboard/`
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cargaboard"))
}

fn global_config_path() -> Option<PathBuf> {
    home_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".cargaboard.toml"))
}

/// Path of the global config file, for display and init.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Path of the project config file, for display.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment overrides read through `var`.
///
/// Supported variables:
/// - `CARGABOARD_API_URL`: backend origin
/// - `CARGABOARD_API_TIMEOUT_MS`: request timeout
/// - `CARGABOARD_SESSION`: session file path
/// - `CARGABOARD_DPR`: device pixel ratio
/// - `CARGABOARD_POLL_SECS`: poll interval
/// - `CARGABOARD_SERVER_ADDR`: `serve` bind address
/// - `CARGABOARD_FETCH_LOG`: fetch log enabled (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut DashboardConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("CARGABOARD_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Some(val) = var("CARGABOARD_API_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Some(val) = var("CARGABOARD_SESSION")
        && !val.is_empty()
    {
        config.api.session_path = val;
    }
    if let Some(val) = var("CARGABOARD_DPR")
        && let Ok(dpr) = val.parse::<f64>()
    {
        config.render.device_pixel_ratio = dpr;
    }
    if let Some(val) = var("CARGABOARD_POLL_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.poll.interval_secs = secs;
    }
    if let Some(val) = var("CARGABOARD_SERVER_ADDR")
        && !val.is_empty()
    {
        config.server.address = val;
    }
    if let Some(val) = var("CARGABOARD_FETCH_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.cargaboard/config.toml`.
///
/// Fails when the file exists, unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.cargaboard/ directory")?;
    }
    fs::write(&path, DashboardConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set one dotted key (e.g. `api.base_url`) in the global config file.
///
/// Starts from the defaults when the file does not exist yet.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DashboardConfig::default())
            .context("failed to serialize default config")?
    };
    let mut root: toml::Value = toml::from_str(&content).context("failed to parse config as TOML value")?;

    set_toml_value(&mut root, key, value)?;

    // The result must still be a valid config.
    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    toml::from_str::<DashboardConfig>(&output)
        .with_context(|| format!("'{value}' is not a valid value for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;
    Ok(())
}

/// Set a value in a TOML tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((section_path, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config key must be 'section.field', got '{key}'");
    };

    let mut current = root;
    for part in section_path.split('.') {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{section_path}'"))?;

    let new_value = match table.get(leaf) {
        None => anyhow::bail!("config key not found: '{key}'"),
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
