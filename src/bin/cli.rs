//! DWLR Monitor CLI
//!
//! Terminal front end for the monitoring core. Every read command works
//! without a backend: data falls back to the local cache or offline data.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dwlr_monitor::{
    error::{AppError, Result},
    gateway::{FallbackData, HttpGateway, MonitorApi},
    models::{Alert, Config, Severity, Station, StationStatus},
    pipeline::{ALL, AlertFilter, Resolution, StationFilter, parse_choice, parse_region},
    services::{
        AlertsView, AuthService, DataSource, RegisterForm, Snapshot, StationDetailView,
        StationsView,
    },
    storage::LocalStorage,
};

const DEGRADED_BANNER: &str = "Could not fetch live data, showing offline data instead";

/// DWLR Monitor - groundwater level dashboard
#[derive(Parser, Debug)]
#[command(
    name = "dwlr",
    version,
    about = "Groundwater monitoring stations, levels and alerts"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "dwlr.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Never contact the backend
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List monitoring stations
    Stations {
        /// Match name, state or district
        #[arg(short, long, default_value = "")]
        search: String,

        /// State to show, or "all"
        #[arg(short, long, default_value = ALL)]
        region: String,

        /// Safe, Warning, Critical or "all"
        #[arg(long, default_value = ALL)]
        status: String,
    },

    /// Show one station with its level history and alerts
    Station {
        id: String,
    },

    /// List alerts, newest first
    Alerts {
        /// Critical, Warning, Info or "all"
        #[arg(long, default_value = ALL)]
        severity: String,

        /// all, active or resolved
        #[arg(long, default_value = ALL)]
        status: String,
    },

    /// Export the alerts report as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sign in
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        confirm: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Validate the configuration
    Validate,
}

/// Initialize logging at the given default level.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Parse the config file before logging is set up, so its log level can be
/// honored. A missing file is not an error.
fn read_config(path: &Path) -> Result<Option<Config>> {
    if path.exists() {
        Config::load(path).map(Some)
    } else {
        Ok(None)
    }
}

fn validate_config(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("✓ Config OK");
    println!("{}", config.to_toml()?);
    Ok(())
}

fn print_banner<T>(snapshot: &Snapshot<T>) {
    if !snapshot.is_degraded() {
        return;
    }
    match (snapshot.source, snapshot.cached_at) {
        (DataSource::Cache, Some(at)) => eprintln!(
            "! {} (cached {})",
            DEGRADED_BANNER,
            at.format("%Y-%m-%d %H:%M UTC")
        ),
        _ => eprintln!("! {}", DEGRADED_BANNER),
    }
}

fn print_station(station: &Station) {
    println!(
        "{:<6} {:<28} {:<24} {:<8} {:>6.2} m  {}",
        station.id,
        station.name,
        format!("{}, {}", station.district, station.state),
        station.status,
        station.current_depth_m,
        station.trend.as_str()
    );
}

fn print_alert(alert: &Alert) {
    println!(
        "{:<10} {:<8} {:<8} {:<26} {}",
        alert.date,
        alert.severity,
        alert.status_label(),
        alert.station_name,
        alert.message
    );
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = read_config(&cli.config);
    let level = match (&loaded, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(Some(config)), false) => config.logging.level.clone(),
        _ => "info".to_string(),
    };
    init_logging(&level);

    let mut config = match loaded {
        Ok(Some(config)) => {
            log::info!("Loaded configuration from {}", cli.config.display());
            config
        }
        Ok(None) => {
            log::info!("No config at {}, using defaults", cli.config.display());
            Config::default()
        }
        Err(e) if matches!(cli.command, Command::Validate) => {
            log::error!("Config load failed from {}: {}", cli.config.display(), e);
            return Err(e);
        }
        Err(e) => {
            log::warn!(
                "Config load failed from {}: {}. Using defaults.",
                cli.config.display(),
                e
            );
            Config::default()
        }
    };
    config.apply_env();
    if cli.offline {
        config.api.offline = true;
    }

    let command = match cli.command {
        Command::Validate => return validate_config(&config),
        command => command,
    };

    let api: Arc<dyn MonitorApi> = Arc::new(HttpGateway::new(
        &config.api,
        FallbackData::from_mode(config.fallback.mode),
    )?);
    let storage = Arc::new(LocalStorage::new(&config.cache.dir));
    log::debug!(
        "Backend {} (offline: {}), cache at {}",
        config.api.base_url,
        config.api.offline,
        storage.root_dir().display()
    );

    match command {
        Command::Stations {
            search,
            region,
            status,
        } => {
            let filter = StationFilter {
                search,
                region: parse_region(&region),
                status: parse_choice::<StationStatus>(&status)?,
            };

            let view = StationsView::new(api, storage);
            let Some(snapshot) = view.load().await.applied() else {
                return Ok(());
            };
            print_banner(&snapshot);

            let stats = view.stats().await;
            println!(
                "{} stations: {} safe ({}%), {} warning ({}%), {} critical ({}%)",
                stats.total,
                stats.safe,
                stats.percent(stats.safe),
                stats.warning,
                stats.percent(stats.warning),
                stats.critical,
                stats.percent(stats.critical)
            );
            println!("Regions: {}", view.regions().await.join(", "));
            println!();

            let visible = view.visible(&filter).await;
            if visible.is_empty() {
                println!("No stations match the current filters.");
            }
            visible.iter().for_each(print_station);
        }

        Command::Station { id } => {
            let view = StationDetailView::new(api, storage);
            let detail = view
                .load(&id)
                .await
                .applied()
                .flatten()
                .ok_or_else(|| AppError::not_found(format!("Station {id}")))?;

            if detail.degraded {
                eprintln!("! {}", DEGRADED_BANNER);
            }
            let station = &detail.station;
            print_station(station);
            println!(
                "Location: {:.4}, {:.4}  Last updated: {}",
                station.latitude,
                station.longitude,
                station.last_updated.format("%Y-%m-%d %H:%M UTC")
            );

            println!();
            println!("Water levels ({} readings):", detail.water_levels.len());
            for level in &detail.water_levels {
                println!(
                    "  {}  {:>6.2} m",
                    level.timestamp.format("%Y-%m-%d"),
                    level.depth_m
                );
            }

            println!();
            println!("Alerts ({}):", detail.alerts.len());
            detail.alerts.iter().for_each(print_alert);
        }

        Command::Alerts { severity, status } => {
            let mut filter = AlertFilter::new().resolution(status.parse::<Resolution>()?);
            if let Some(severity) = parse_choice::<Severity>(&severity)? {
                filter = filter.severity(severity);
            }

            let view = AlertsView::new(api, storage);
            let Some(snapshot) = view.load().await.applied() else {
                return Ok(());
            };
            print_banner(&snapshot);

            let stats = view.stats().await;
            println!(
                "{} alerts: {} active, {} critical active",
                stats.total, stats.active, stats.critical_active
            );
            println!();

            let visible = view.visible(&filter).await;
            if visible.is_empty() {
                println!("No alerts match the current filters.");
            }
            visible.iter().for_each(print_alert);
        }

        Command::Export { output } => {
            let view = AlertsView::new(api, storage);
            let report = view.export_report().await;
            if report.is_fallback() {
                eprintln!("! {}", DEGRADED_BANNER);
            }

            match output {
                Some(path) => {
                    tokio::fs::write(&path, report.get()).await?;
                    log::info!("Alerts report written to {}", path.display());
                }
                None => println!("{}", report.get()),
            }
        }

        Command::Login { email, password } => {
            let auth = AuthService::new(api, storage);
            match auth.login(&email, &password).await? {
                Some(user) => println!("Signed in as {} <{}> ({})", user.name, user.email, user.role),
                None => {
                    return Err(AppError::validation("Invalid email or password"));
                }
            }
        }

        Command::Register {
            email,
            name,
            password,
            confirm,
        } => {
            let auth = AuthService::new(api, storage);
            let form = RegisterForm {
                email,
                name,
                password,
                confirm_password: confirm,
            };
            match auth.register(&form).await? {
                Some(user) => println!("Account created for {} <{}>", user.name, user.email),
                None => {
                    return Err(AppError::validation(
                        "Could not create account. Please try again.",
                    ));
                }
            }
        }

        Command::Logout => {
            AuthService::new(api, storage).logout().await?;
            println!("Signed out");
        }

        Command::Whoami => match AuthService::new(api, storage).current_user().await {
            Some(user) => println!("{} <{}> ({}, id {})", user.name, user.email, user.role, user.id),
            None => println!("Not signed in"),
        },

        // Handled before the gateway is built
        Command::Validate => {}
    }

    Ok(())
}
