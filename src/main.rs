use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use cargaboard::api::StatsClient;
use cargaboard::cli::{self, OutputFormat, PageArgs};
use cargaboard::pages::{Filter, Station, comparatives, dashboard, drivers, sustainability, users};
use cargaboard::{config, diagnostics};

#[derive(Debug, Parser)]
#[command(name = "cargaboard")]
#[command(about = "Dashboards for the EV-charging statistics backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct PageOpts {
    /// Station: all, Portobelo, Salvio
    #[arg(long, default_value = "all")]
    station: String,
    /// Aggregation window: total, mes, diario
    #[arg(long, default_value = "total")]
    filter: String,
    /// 1-based page of the driver list
    #[arg(long)]
    page: Option<usize>,
    /// Toggles to open after loading (e.g. toggleUsers, btnUnclassified)
    #[arg(long, value_delimiter = ',')]
    open: Vec<String>,
    /// Write every chart as SVG into this directory
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format: table (default), json
    #[arg(long, default_value = "table")]
    format: String,
    /// Re-poll the page every poll.interval_secs
    #[arg(long)]
    watch: bool,
}

impl PageOpts {
    fn into_args(self) -> PageArgs {
        PageArgs {
            station: Station::parse(&self.station),
            filter: Filter::parse(&self.filter),
            page: self.page,
            open: self.open,
            out: self.out,
            format: OutputFormat::from_str_opt(Some(&self.format)),
            watch: self.watch,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in; the password is read from CARGABOARD_PASSWORD or stdin
    Login {
        email: String,
    },
    /// Log out and forget the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Renew the access token
    Refresh,
    /// Station dashboard
    Dashboard(PageOpts),
    /// Driver ranking, habits and loyalty
    Drivers(PageOpts),
    /// Paginated driver list
    Users(PageOpts),
    /// Energy and CO2 figures
    Sustainability(PageOpts),
    /// Portobelo vs Salvio
    Compare(PageOpts),
    /// Vehicle models without an EV/PHEV category
    Unclassified {
        #[arg(long, default_value = "all")]
        station: String,
        #[arg(long, default_value = "total")]
        filter: String,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Serve the dashboard as HTML
    Serve {
        /// Listen address (default from [server] address)
        #[arg(long)]
        addr: Option<String>,
        /// Open the dashboard in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Check backend, session, config and fetch log
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default ~/.cargaboard/config.toml
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `api.base_url`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let mut config = config::load();
    diagnostics::init_tracing(&config.logging.level);

    let client = StatsClient::from_config(&config);

    match app.command {
        Commands::Login { email } => cli::run_login(&client, &email),
        Commands::Logout => cli::run_logout(&client),
        Commands::Whoami => cli::run_whoami(&client),
        Commands::Refresh => cli::run_refresh(&client),
        Commands::Dashboard(opts) => cli::run_page(&client, &config, dashboard::ROUTE, &opts.into_args()),
        Commands::Drivers(opts) => cli::run_page(&client, &config, drivers::ROUTE, &opts.into_args()),
        Commands::Users(opts) => cli::run_page(&client, &config, users::ROUTE, &opts.into_args()),
        Commands::Sustainability(opts) => {
            cli::run_page(&client, &config, sustainability::ROUTE, &opts.into_args())
        }
        Commands::Compare(opts) => cli::run_page(&client, &config, comparatives::ROUTE, &opts.into_args()),
        Commands::Unclassified {
            station,
            filter,
            format,
        } => cli::run_unclassified(
            &client,
            &Station::parse(&station),
            &Filter::parse(&filter),
            OutputFormat::from_str_opt(Some(&format)),
        ),
        Commands::Serve { addr, open } => {
            if let Some(addr) = addr {
                config.server.address = addr;
            }
            config.server.open_browser |= open;
            cli::run_serve(&client, &config)
        }
        Commands::Health => cli::run_health(&client, &config, client.session_path()),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
