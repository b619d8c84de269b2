//! Command-line argument definitions for the GNSS integrity checker
//!
//! Every subcommand runs one check (or one maintenance action) over a station
//! list and a date range, using the clap derive API.

use crate::app::models::StationId;
use crate::app::services::spatial::Disposition;
use crate::app::services::station_info::StationInfoFormat;
use crate::constants::MAX_PARALLEL_WORKERS;
use crate::date::{DateRange, GnssDate, parse_date_filter, parse_date_token};
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the GNSS integrity checker
///
/// Quality-control and metadata-consistency checks over a GNSS observation
/// archive and its catalog.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gnss-integrity",
    version,
    about = "Integrity and metadata checks for a GNSS RINEX archive and its catalog",
    long_about = "Checks a GNSS observation archive against its catalog: RINEX files missing from \
                  the archive, receiver serials that disagree with station information, gaps in \
                  the observation record, station information coverage, and PPP solutions that \
                  do not land on their declared station. Also merges stations and maintains \
                  solutions and inventory."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Remove inventory rows whose file is missing from the archive
    CheckRinex(CommonArgs),
    /// Count processed RINEX files per day over the selected stations
    RinexCount(CommonArgs),
    /// Compare RINEX receiver serials with station information
    StninfoRinex(CommonArgs),
    /// Check station information for overlaps, gaps and coverage
    StninfoCheck(CommonArgs),
    /// Propose station information from RINEX header metadata
    StninfoPropose(IgnoreDaysArgs),
    /// List gaps in the observation record
    Gaps(IgnoreDaysArgs),
    /// Draw a per-year chart of observed days
    GapChart(CommonArgs),
    /// Check that PPP solutions land on their declared station
    Spatial(SpatialArgs),
    /// Print station information
    PrintStninfo(PrintArgs),
    /// Insert station information records from a station.info file
    StninfoInsert(InsertArgs),
    /// Move a station's RINEX files and inventory to another station
    Rename(RenameArgs),
    /// Add PPP solutions in a date range to the exclusion table
    ExcludeSolutions(ExcludeArgs),
    /// Delete RINEX inventory rows at or below a completion limit
    DeleteRinex(DeleteRinexArgs),
}

impl Commands {
    /// Arguments shared by every subcommand
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::CheckRinex(args)
            | Commands::RinexCount(args)
            | Commands::StninfoRinex(args)
            | Commands::StninfoCheck(args)
            | Commands::GapChart(args) => args,
            Commands::StninfoPropose(args) | Commands::Gaps(args) => &args.common,
            Commands::Spatial(args) => &args.common,
            Commands::PrintStninfo(args) => &args.common,
            Commands::StninfoInsert(args) => &args.common,
            Commands::Rename(args) => &args.common,
            Commands::ExcludeSolutions(args) => &args.common,
            Commands::DeleteRinex(args) => &args.common,
        }
    }

    /// Name used in logs and summaries
    pub fn name(&self) -> &'static str {
        match self {
            Commands::CheckRinex(_) => "check-rinex",
            Commands::RinexCount(_) => "rinex-count",
            Commands::StninfoRinex(_) => "stninfo-rinex",
            Commands::StninfoCheck(_) => "stninfo-check",
            Commands::StninfoPropose(_) => "stninfo-propose",
            Commands::Gaps(_) => "gaps",
            Commands::GapChart(_) => "gap-chart",
            Commands::Spatial(_) => "spatial",
            Commands::PrintStninfo(_) => "print-stninfo",
            Commands::StninfoInsert(_) => "stninfo-insert",
            Commands::Rename(_) => "rename",
            Commands::ExcludeSolutions(_) => "exclude-solutions",
            Commands::DeleteRinex(_) => "delete-rinex",
        }
    }
}

/// Station selection, date range and runtime options
#[derive(Debug, Clone, ClapArgs)]
pub struct CommonArgs {
    /// Stations to process
    ///
    /// `all`, `net.all`, `net.stn` or `stn` (every network with that code).
    /// Prefix a token with `-` to remove it from the selection; removals go
    /// after a `--` separator. A single argument naming a file reads one
    /// token per line.
    #[arg(
        value_name = "STATIONS",
        required = true,
        num_args = 1..,
        help = "Stations: all | net.all | net.stn | stn; after '--', '-net.stn' removes"
    )]
    pub stations: Vec<String>,

    /// Date range limiting the check
    ///
    /// One or two dates in fyear, yyyy_ddd, yyyy/mm/dd or gpswk-wkday form. A
    /// bare number as the first date means that many days before today.
    #[arg(
        short = 'd',
        long = "date-filter",
        value_name = "DATE",
        num_args = 1..=2,
        help = "Start and optional end date (fyear, yyyy_ddd, yyyy/mm/dd, gpswk-wkday)"
    )]
    pub date_filter: Vec<String>,

    /// Configuration file path
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Configuration file path"
    )]
    pub config_file: Option<PathBuf>,

    /// Catalog snapshot overriding the configured one
    #[arg(long = "catalog", value_name = "PATH", help = "Catalog snapshot (JSON)")]
    pub catalog: Option<PathBuf>,

    /// Archive root overriding the configured one
    #[arg(long = "archive", value_name = "PATH", help = "RINEX archive root")]
    pub archive: Option<PathBuf>,

    /// Number of parallel workers for per-station checks
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "NUM",
        help = "Number of parallel workers"
    )]
    pub workers: Option<usize>,

    /// Run per-station checks one after the other
    #[arg(long = "serial", help = "Run checks serially instead of in parallel")]
    pub serial: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl CommonArgs {
    pub fn validate(&self) -> Result<()> {
        if let Some(workers) = self.workers {
            if workers == 0 || workers > MAX_PARALLEL_WORKERS {
                return Err(Error::configuration(format!(
                    "Workers must be between 1 and {}, got {}",
                    MAX_PARALLEL_WORKERS, workers
                )));
            }
        }
        if let Some(config) = &self.config_file {
            if !config.is_file() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config.display()
                )));
            }
        }
        self.date_range()?;
        Ok(())
    }

    /// Date range from `--date-filter`, defaulting to 1980 day 001 .. today
    pub fn date_range(&self) -> Result<DateRange> {
        parse_date_filter(&self.date_filter)
    }

    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

/// Arguments for commands that can ignore short runs
#[derive(Debug, Clone, ClapArgs)]
pub struct IgnoreDaysArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Ignore runs of this many days or fewer
    #[arg(
        long = "ignore-days",
        value_name = "DAYS",
        default_value_t = 0,
        help = "Ignore runs lasting this many days or fewer"
    )]
    pub ignore_days: i64,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct SpatialArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// What to do with solutions that do not match their station
    #[arg(
        long = "disposition",
        value_enum,
        default_value_t = Disposition::Noop,
        help = "Action for non-matching solutions"
    )]
    pub disposition: Disposition,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct PrintArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(
        long = "format",
        value_enum,
        default_value_t = StationInfoFormat::Long,
        help = "Output format"
    )]
    pub format: StationInfoFormat,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct InsertArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// station.info formatted file with the records to insert
    #[arg(long = "file", value_name = "FILE", help = "station.info file to insert")]
    pub file: PathBuf,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct RenameArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Destination station in net.stn form
    #[arg(long = "dest", value_name = "NET.STN", help = "Destination station (net.stn)")]
    pub dest: StationId,
}

impl RenameArgs {
    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;
        if self.common.stations.len() != 1 {
            return Err(Error::validation(
                "Station rename requires exactly one origin station",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ExcludeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// First and last day whose solutions are excluded
    #[arg(
        long = "range",
        value_names = ["START", "END"],
        num_args = 2,
        required = true,
        help = "Start and end date of the solutions to exclude"
    )]
    pub range: Vec<String>,
}

impl ExcludeArgs {
    pub fn solution_range(&self) -> Result<DateRange> {
        explicit_range(&self.range)
    }
}

#[derive(Debug, Clone, ClapArgs)]
pub struct DeleteRinexArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// First and last day of the rows to delete
    #[arg(
        long = "range",
        value_names = ["START", "END"],
        num_args = 2,
        required = true,
        help = "Start and end date of the RINEX files to delete"
    )]
    pub range: Vec<String>,

    /// Rows with a completion at or below this value are deleted
    #[arg(
        long = "completion",
        value_name = "LIMIT",
        help = "Delete files with completion <= LIMIT"
    )]
    pub completion: f64,
}

impl DeleteRinexArgs {
    pub fn deletion_range(&self) -> Result<DateRange> {
        explicit_range(&self.range)
    }

    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;
        if !(0.0..=1.0).contains(&self.completion) {
            return Err(Error::validation(format!(
                "Completion limit must be between 0 and 1, got {}",
                self.completion
            )));
        }
        self.deletion_range()?;
        Ok(())
    }
}

/// Two date tokens without the day-count shorthand
fn explicit_range(tokens: &[String]) -> Result<DateRange> {
    let today = GnssDate::today();
    match tokens {
        [start, end] => DateRange::new(
            parse_date_token(start, 1, today)?,
            parse_date_token(end, 1, today)?,
        ),
        _ => Err(Error::validation("Expected a start and an end date")),
    }
}
