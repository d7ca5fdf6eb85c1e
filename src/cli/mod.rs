//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `cargaboard login | logout | whoami | refresh`: session management
//! - `cargaboard dashboard | drivers | users | sustainability | compare`:
//!   load a page and print it, export its charts, or watch it
//! - `cargaboard unclassified`: vehicle models without an EV/PHEV category
//! - `cargaboard serve`: local HTML dashboard
//! - `cargaboard health`: backend, session, config and fetch log checks
//! - `cargaboard config show|init|set|reset`: configuration management

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::api::{ApiError, StatsApi};
use crate::auth::{self, AuthOutcome};
use crate::config::{self, DashboardConfig};
use crate::diagnostics::fetch_log::{FetchLog, summarize};
use crate::pages::document::{Content, Node};
use crate::pages::{Document, Filter, Page, RenderOptions, Station, open_page};
use crate::web;

/// Output format for page commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Options shared by the page commands.
#[derive(Debug, Clone)]
pub struct PageArgs {
    pub station: Station,
    pub filter: Filter,
    pub page: Option<usize>,
    /// Toggle ids to open after loading, e.g. `toggleUsers`.
    pub open: Vec<String>,
    pub out: Option<PathBuf>,
    pub format: OutputFormat,
    pub watch: bool,
}

// ---------------------------------------------------------------------------
// cargaboard login | logout | whoami | refresh
// ---------------------------------------------------------------------------

/// Log in and persist the session cookies. The password is read from
/// `CARGABOARD_PASSWORD`, or from stdin when the variable is unset.
pub fn run_login<A: StatsApi + ?Sized>(api: &A, email: &str) -> Result<()> {
    let password = match std::env::var("CARGABOARD_PASSWORD") {
        Ok(p) => p,
        Err(_) => prompt("Contraseña: ")?,
    };
    match auth::login(api, email, &password) {
        Ok(identity) => {
            let who = identity.name.or(identity.email).unwrap_or_else(|| email.to_string());
            println!("{} Sesión iniciada como {}", "✓".green().bold(), who.bold());
            Ok(())
        }
        Err(message) => bail!(message),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn run_logout<A: StatsApi + ?Sized>(api: &A) -> Result<()> {
    auth::logout(api);
    println!("{} Sesión cerrada", "✓".green().bold());
    Ok(())
}

pub fn run_whoami<A: StatsApi + ?Sized>(api: &A) -> Result<()> {
    let mut doc = Document::new("whoami");
    crate::pages::declare_chrome(&mut doc, "/", &Filter::Total);
    match auth::bootstrap(api, &mut doc) {
        AuthOutcome::Authenticated(identity) => {
            println!(
                "  {} {}",
                "Nombre:".bold(),
                identity.name.as_deref().unwrap_or("-")
            );
            println!(
                "  {} {}",
                "Email: ".bold(),
                identity.email.as_deref().unwrap_or("-")
            );
            Ok(())
        }
        AuthOutcome::Redirect(_) => bail!(not_logged_in()),
    }
}

/// Renew the access token with the refresh cookie.
pub fn run_refresh<A: StatsApi + ?Sized>(api: &A) -> Result<()> {
    match api.refresh() {
        Ok(()) => {
            println!("{} Sesión renovada", "✓".green().bold());
            Ok(())
        }
        Err(ApiError::Unauthorized) => bail!(not_logged_in()),
        Err(e) => Err(e).context("refresh failed"),
    }
}

fn not_logged_in() -> String {
    "no hay sesión activa; ejecuta `cargaboard login <email>`".to_string()
}

// ---------------------------------------------------------------------------
// cargaboard dashboard | drivers | users | sustainability | compare
// ---------------------------------------------------------------------------

/// Load a page, then print it and export its charts. With `watch` the page
/// is polled every `poll.interval_secs` until interrupted.
pub fn run_page<A: StatsApi + ?Sized>(
    api: &A,
    config: &DashboardConfig,
    route: &str,
    args: &PageArgs,
) -> Result<()> {
    let opts = RenderOptions::from_config(config);
    let mut page = open_page(route, api, opts, args.station.clone(), args.filter.clone())
        .with_context(|| format!("unknown page {route}"))?;

    if let AuthOutcome::Redirect(_) = auth::bootstrap(api, page.document_mut()) {
        bail!(not_logged_in());
    }

    page.load();
    for id in &args.open {
        match web::toggle_event(id) {
            Some(event) => {
                page.handle(event);
            }
            None => tracing::warn!(toggle = %id, "unknown toggle"),
        }
    }
    if let Some(n) = args.page {
        page.go_to_page(n);
    }
    emit(page.as_ref(), args)?;

    if args.watch {
        let interval = Duration::from_secs(config.poll.interval_secs.max(1));
        loop {
            thread::sleep(interval);
            page.poll();
            emit(page.as_ref(), args)?;
        }
    }
    Ok(())
}

fn emit(page: &dyn Page, args: &PageArgs) -> Result<()> {
    let doc = page.document();
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&doc.to_json())?),
        OutputFormat::Table => print!("{}", render_text(doc)),
    }
    if let Some(dir) = &args.out {
        let written = export_charts(doc, page.route(), dir)?;
        println!(
            "{} {} charts written to {}",
            "✓".green().bold(),
            written.len(),
            dir.display()
        );
    }
    Ok(())
}

/// Write every painted chart as `{page}-{id}.svg`. Returns the files
/// written.
pub fn export_charts(doc: &Document, route: &str, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let stem = match route.trim_matches('/') {
        "" => "dashboard",
        other => other,
    };
    let mut written = Vec::new();
    for (id, chart) in doc.charts() {
        let path = dir.join(format!("{stem}-{id}.svg"));
        fs::write(&path, chart.svg.to_svg())
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Terminal rendering of a page: visible nodes only, charts summarised by
/// kind and size.
pub fn render_text(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n{}\n", doc.title.bold().cyan(), "=".repeat(60)));
    for node in doc.nodes().iter().filter(|n| !n.hidden) {
        render_node(&mut out, node);
    }
    out.push('\n');
    out
}

fn render_node(out: &mut String, node: &Node) {
    match &node.content {
        Content::Text(text) if !text.is_empty() => {
            out.push_str(&format!("  {:<28} {}\n", node.label.bold(), text));
        }
        Content::Text(_) => {}
        Content::Chart(Some(chart)) => {
            let (w, h) = crate::charts::Canvas2d::css_size(&chart.svg);
            out.push_str(&format!(
                "  {:<28} {}\n",
                node.label.bold(),
                format!("[{} {w:.0}x{h:.0}]", chart.layout.kind()).dimmed()
            ));
        }
        Content::Chart(None) => {
            out.push_str(&format!("  {:<28} {}\n", node.label.bold(), "(sin datos)".dimmed()));
        }
        Content::Items(items) => {
            out.push_str(&format!("  {}\n", node.label.bold().cyan()));
            for item in items {
                if item.disabled {
                    out.push_str(&format!("    · {}\n", item.text.dimmed()));
                } else {
                    out.push_str(&format!("    · {}\n", item.text));
                }
            }
        }
        Content::Cards(cards) => {
            out.push_str(&format!("  {}\n", node.label.bold().cyan()));
            for (i, card) in cards.iter().enumerate() {
                let fields: Vec<String> = card.fields.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                let line = format!("    {:<24} {}", card.title, fields.join("  "));
                if i % 2 == 0 {
                    out.push_str(&format!("{line}\n"));
                } else {
                    out.push_str(&format!("{}\n", line.dimmed()));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// cargaboard unclassified
// ---------------------------------------------------------------------------

pub fn run_unclassified<A: StatsApi + ?Sized>(
    api: &A,
    station: &Station,
    filter: &Filter,
    format: OutputFormat,
) -> Result<()> {
    let models = match api.unclassified_models(station.as_str(), filter.as_str()) {
        Ok(models) => models,
        Err(ApiError::Unauthorized) => bail!(not_logged_in()),
        Err(e) => {
            tracing::warn!(error = %e, "unclassified models failed");
            bail!(crate::pages::dashboard::UNCLASSIFIED_ERROR)
        }
    };
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = models
                .iter()
                .map(|m| serde_json::json!({ "brand": m.brand, "model": m.model, "count": m.count }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            println!("{}", "Modelos sin clasificar".bold().cyan());
            for item in crate::pages::dashboard::unclassified_items(&models) {
                println!("  {}", item.text);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// cargaboard serve
// ---------------------------------------------------------------------------

pub fn run_serve<A: StatsApi + ?Sized>(api: &A, config: &DashboardConfig) -> Result<()> {
    web::serve(api, config)
}

// ---------------------------------------------------------------------------
// cargaboard health
// ---------------------------------------------------------------------------

/// Check backend reachability, session, config and the fetch log.
pub fn run_health<A: StatsApi + ?Sized>(
    api: &A,
    config: &DashboardConfig,
    session_path: Option<&Path>,
) -> Result<()> {
    println!("{}", "cargaboard Health Check".bold().cyan());
    println!("{}", "=".repeat(50));

    // 1. Config
    let config_path = config::global_config_file();
    let config_exists = config_path.as_ref().map(|p| p.exists()).unwrap_or(false);
    print_health_item(
        "Config",
        true,
        &if config_exists {
            config_path
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        } else {
            "using defaults (no config file)".to_string()
        },
    );

    // 2. Backend and session
    let (api_ok, api_detail, session_ok) = match api.me() {
        Ok(identity) => (
            true,
            format!("reachable at {}", config.api.base_url),
            Some(identity.email.unwrap_or_default()),
        ),
        Err(ApiError::Unauthorized) => (true, format!("reachable at {}", config.api.base_url), None),
        Err(e) => (false, format!("not reachable: {e}"), None),
    };
    print_health_item("Backend", api_ok, &api_detail);

    let session_file = session_path.map(|p| p.exists()).unwrap_or(false);
    let session_detail = match (&session_ok, session_file) {
        (Some(email), _) => format!("authenticated as {email}"),
        (None, true) => "session file present but rejected".to_string(),
        (None, false) => "not logged in".to_string(),
    };
    print_health_item("Session", session_ok.is_some(), &session_detail);

    // 3. Fetch log
    let log = FetchLog::from_config(&config.logging);
    let entries = log.read_since_hours(24);
    let summary = summarize(&entries);
    let log_ok = summary.calls == 0 || summary.failure_pct() < 50.0;
    print_health_item(
        "Fetch log (24h)",
        log_ok,
        &if summary.calls == 0 {
            "no calls recorded".to_string()
        } else {
            format!(
                "{} calls, {:.1}% failed, {} unauthorized, avg {:.0}ms",
                summary.calls,
                summary.failure_pct(),
                summary.unauthorized,
                summary.avg_latency_ms
            )
        },
    );
    for endpoint in summary.endpoints.iter().take(5) {
        println!(
            "      {:<40} {:>5} {:>4} failed {:>6.0}ms",
            endpoint.endpoint.dimmed(),
            endpoint.calls,
            endpoint.failures,
            endpoint.avg_latency_ms
        );
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// cargaboard config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective cargaboard Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.cargaboard/config.toml");
    print_source(project_exists, ".cargaboard.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "CARGABOARD_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.cargaboard/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::Item;

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Table);
    }

    #[test]
    fn text_rendering_skips_hidden_nodes() {
        colored::control::set_override(false);
        let mut doc = Document::new("Panel");
        doc.declare_text("totalCargas", "Total cargas", "120")
            .declare_items("panel", "Modelos")
            .declare_disclosure("btn", &["panel"], false, "Ver", "Ver");
        doc.set_items("panel", vec![Item::text("Tesla - — 4")]);
        let text = render_text(&doc);
        assert!(text.contains("120"));
        assert!(!text.contains("Tesla"));
        doc.set_expanded("btn", true);
        assert!(render_text(&doc).contains("Tesla - — 4"));
    }

    #[test]
    fn charts_export_as_svg_files() {
        let dir = std::env::temp_dir().join(format!("cargaboard-export-{}", std::process::id()));
        let mut doc = Document::new("t");
        doc.declare_chart("barsCU", "Cargas");
        let opts = RenderOptions::default();
        let chart = crate::pages::paint(&opts, 400.0, 300.0, |c| {
            crate::pages::Layout::Donut(crate::charts::pie::draw_donut(c, 1.0, 2.0, "recurrentes"))
        });
        doc.set_chart("barsCU", chart);
        let written = export_charts(&doc, "/", &dir).unwrap();
        assert_eq!(written, vec![dir.join("dashboard-barsCU.svg")]);
        assert!(fs::read_to_string(&written[0]).unwrap().starts_with("<svg"));
        let _ = fs::remove_dir_all(&dir);
    }
}
