//! Shared components for CLI commands
//!
//! Logging setup, layered configuration, catalog access, station selection and
//! the per-station job loop every batch command goes through.

use crate::app::adapters::catalog::{Catalog, CatalogConnector};
use crate::app::adapters::memory_catalog::MemoryConnector;
use crate::app::models::StationId;
use crate::app::services::dispatcher::{JobDispatcher, ProgressReporter};
use crate::app::services::station_selection::{expand_station_tokens, select_stations};
use crate::cli::args::CommonArgs;
use crate::config::Config;
use crate::date::DateRange;
use crate::{Error, Result};
use colored::*;
use indicatif::HumanDuration;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome counters reported at the end of every command
#[derive(Debug, Clone, Default)]
pub struct CheckStats {
    /// Stations the command ran on
    pub stations_checked: usize,
    /// Stations whose check returned an error
    pub stations_failed: usize,
    /// Problems reported (or rows changed, for maintenance commands)
    pub findings: usize,
    pub processing_time: Duration,
}

impl CheckStats {
    pub fn print_summary(&self, command: &str) {
        println!("\n{}", format!("{} summary", command).bright_green().bold());
        println!(
            "   • Stations checked: {}",
            self.stations_checked.to_string().bright_white().bold()
        );
        if self.stations_failed > 0 {
            println!(
                "   • Stations failed: {}",
                self.stations_failed.to_string().bright_red().bold()
            );
        }
        println!(
            "   • Findings: {}",
            self.findings.to_string().bright_white().bold()
        );
        println!("   • Time: {}", HumanDuration(self.processing_time));
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &CommonArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gnss_integrity={}", log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let initialised = if args.quiet {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    initialised.map_err(|e| Error::configuration(format!("Logging setup failed: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using the layered approach (file -> env -> args)
pub fn load_configuration(args: &CommonArgs) -> Result<Config> {
    let default_config_path = if args.config_file.is_none() {
        Config::default_config_path().ok()
    } else {
        None
    };

    let config_file = match &args.config_file {
        Some(path) => Some(path.as_path()),
        None => default_config_path
            .as_ref()
            .filter(|path| path.exists())
            .map(|path| path.as_path()),
    };

    match config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => info!("No config file found, using defaults and environment variables"),
    }

    let mut config = Config::load_layered(config_file)?;
    apply_cli_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut Config, args: &CommonArgs) {
    if let Some(archive) = &args.archive {
        config.archive.root = archive.clone();
    }
    if let Some(catalog) = &args.catalog {
        config.catalog.snapshot_path = catalog.clone();
    }
    if let Some(workers) = args.workers {
        config.performance.parallel_workers = workers;
    }
    if args.serial {
        config.performance.serial = true;
    }
}

/// Everything a command needs once arguments are parsed
pub struct CommandContext {
    pub config: Config,
    pub connector: Arc<MemoryConnector>,
    pub stations: Vec<StationId>,
    pub range: DateRange,
    pub quiet: bool,
}

impl CommandContext {
    pub fn prepare(args: &CommonArgs) -> Result<Self> {
        args.validate()?;
        let config = load_configuration(args)?;
        let connector = Arc::new(MemoryConnector::load(&config.catalog.snapshot_path)?);
        let range = args.date_range()?;
        let stations = resolve_stations(connector.as_ref(), &args.stations)?;
        info!("{} stations selected, {}", stations.len(), range);

        Ok(Self {
            config,
            connector,
            stations,
            range,
            quiet: args.quiet,
        })
    }

    /// Write the catalog back after a command changed it
    pub fn persist(&self) -> Result<()> {
        self.connector.save()?;
        info!(
            "Catalog saved to {}",
            self.config.catalog.snapshot_path.display()
        );
        Ok(())
    }

    pub fn dispatcher<T: Send + 'static>(&self, message: &str) -> JobDispatcher<T> {
        let progress = if self.quiet {
            ProgressReporter::hidden()
        } else {
            ProgressReporter::new(message)
        };
        JobDispatcher::new(self.config.performance.parallel_workers)
            .serial(self.config.performance.serial)
            .with_progress(progress)
    }

    /// Run `check` once per selected station on its own catalog connection
    ///
    /// `on_report` prints a successful result and returns how many findings
    /// it holds. Failed stations are printed and counted, never re-raised.
    pub async fn run_per_station<T, F, R>(
        &self,
        message: &str,
        check: F,
        mut on_report: R,
    ) -> Result<CheckStats>
    where
        T: Send + 'static,
        F: Fn(&mut dyn Catalog, &StationId) -> Result<T> + Send + Sync + 'static,
        R: FnMut(&StationId, &T) -> usize,
    {
        let start_time = Instant::now();
        let check = Arc::new(check);
        let mut dispatcher = self.dispatcher::<T>(message);

        for station in &self.stations {
            let connector = Arc::clone(&self.connector);
            let check = Arc::clone(&check);
            let station_id = station.clone();
            dispatcher.submit(station.to_string(), move || {
                let mut catalog = connector.connect()?;
                (*check)(catalog.as_mut(), &station_id)
            });
        }

        let progress = dispatcher.progress().clone();
        let mut stats = CheckStats {
            stations_checked: self.stations.len(),
            ..CheckStats::default()
        };
        dispatcher
            .wait(|result| match &result.outcome {
                Ok(report) => {
                    if let Some(station) = self.stations.get(result.index) {
                        stats.findings += progress.suspend(|| on_report(station, report));
                    }
                }
                Err(e) => {
                    stats.stations_failed += 1;
                    progress.suspend(|| {
                        eprintln!("{} {}", format!("{}:", result.label).bright_red().bold(), e)
                    });
                }
            })
            .await;
        progress.finish(message);

        stats.processing_time = start_time.elapsed();
        Ok(stats)
    }
}

/// Expand the station tokens against the catalog's station list
pub fn resolve_stations(connector: &dyn CatalogConnector, tokens: &[String]) -> Result<Vec<StationId>> {
    let tokens = expand_station_tokens(tokens)?;
    let catalog = connector.connect()?;
    let selected = select_stations(&catalog.stations()?, &tokens);
    if selected.is_empty() {
        return Err(Error::validation(format!(
            "No stations match '{}'",
            tokens.join(" ")
        )));
    }
    Ok(selected)
}

/// Print one station's findings under a heading
pub fn print_findings(station: &StationId, findings: &[String]) {
    if findings.is_empty() {
        return;
    }
    println!("{}", format!(" -- {}", station).bright_yellow().bold());
    for finding in findings {
        println!("    {}", finding);
    }
}
