//! Station information commands: audit, proposal, printing and insertion

use crate::app::adapters::catalog::{Catalog, CatalogConnector, RinexTable};
use crate::app::models::{StationId, StationInfoRecord};
use crate::app::services::rinex_reconciler::audit_station_info;
use crate::app::services::station_info::format::{format_history, parse_stninfo_text};
use crate::app::services::station_info::{
    CalibrationChecker, StationInfoFormat, StationInfoStore, propose_from_observations,
};
use crate::cli::args::{CommonArgs, IgnoreDaysArgs, InsertArgs, PrintArgs};
use crate::cli::commands::shared::{CheckStats, CommandContext, print_findings};
use crate::{Error, Result};
use colored::*;
use std::time::Instant;
use tracing::{info, warn};

/// Overlaps, multiple open records, uncovered observations and calibrations
pub async fn run_stninfo_check(args: &CommonArgs) -> Result<CheckStats> {
    let context = CommandContext::prepare(args)?;
    let frames = context.config.frames()?;
    if frames.is_empty() {
        info!("No reference frames configured, skipping the antenna calibration check");
    }

    context
        .run_per_station(
            "Checking station information",
            move |catalog, station| {
                let mut checker = CalibrationChecker::new(frames.clone());
                let calibrations = if checker.has_frames() {
                    Some(&mut checker)
                } else {
                    None
                };
                audit_station_info(catalog, station, calibrations)
            },
            |station, audit| {
                let findings = audit.messages();
                print_findings(station, &findings);
                findings.len()
            },
        )
        .await
}

/// Print a station info history built from RINEX header metadata
pub async fn run_stninfo_propose(args: &IgnoreDaysArgs) -> Result<CheckStats> {
    let context = CommandContext::prepare(&args.common)?;
    let range = context.range;
    let ignore_days = args.ignore_days;
    context
        .run_per_station(
            "Proposing station information",
            move |catalog, station| {
                let rows = catalog.rinex_in_range(station, &range, RinexTable::Processed)?;
                Ok(propose_from_observations(station, &rows, ignore_days))
            },
            |station, proposal| {
                print_history(station, proposal, StationInfoFormat::Long);
                proposal.len()
            },
        )
        .await
}

pub async fn run_print_stninfo(args: &PrintArgs) -> Result<CheckStats> {
    let context = CommandContext::prepare(&args.common)?;
    let format = args.format;
    context
        .run_per_station(
            "Reading station information",
            |catalog, station| {
                let store = StationInfoStore::load(&*catalog, station, None, true)?;
                Ok(store.records().to_vec())
            },
            |station, records| {
                print_history(station, records, format);
                0
            },
        )
        .await
}

fn print_history(station: &StationId, records: &[StationInfoRecord], format: StationInfoFormat) {
    if records.is_empty() {
        println!("{}", format!("# {}: no station information", station).yellow());
        return;
    }
    if format == StationInfoFormat::Long {
        println!("{}", format!("# {}", station.to_string().to_uppercase()).bold());
    }
    println!("{}", format_history(records, format));
}

/// Insert the records of a station.info file into every selected station
///
/// Only lines whose SITE column matches the station code are used. Each
/// record is checked against the existing history before it goes in.
pub async fn run_stninfo_insert(args: &InsertArgs) -> Result<CheckStats> {
    let start_time = Instant::now();
    let context = CommandContext::prepare(&args.common)?;
    let text = std::fs::read_to_string(&args.file).map_err(|e| {
        Error::io(
            format!("Failed to read station info file {}", args.file.display()),
            e,
        )
    })?;

    let mut catalog = context.connector.connect()?;
    let mut stats = CheckStats {
        stations_checked: context.stations.len(),
        ..CheckStats::default()
    };

    for station in &context.stations {
        match insert_into_station(catalog.as_mut(), station, &text) {
            Ok(inserted) => stats.findings += inserted,
            Err(e) => {
                stats.stations_failed += 1;
                eprintln!("{} {}", format!("{}:", station).bright_red().bold(), e);
            }
        }
    }

    if stats.findings > 0 {
        context.persist()?;
    }
    stats.processing_time = start_time.elapsed();
    Ok(stats)
}

fn insert_into_station(catalog: &mut dyn Catalog, station: &StationId, text: &str) -> Result<usize> {
    let records: Vec<StationInfoRecord> = parse_stninfo_text(text, &station.network_code)?
        .into_iter()
        .filter(|r| r.station.station_code.eq_ignore_ascii_case(&station.station_code))
        .map(|r| r.retagged(station))
        .collect();
    if records.is_empty() {
        warn!("No records for {} in the station info file", station);
        return Ok(0);
    }

    let mut store = StationInfoStore::load(&*catalog, station, None, true)?;
    let mut inserted = 0;
    for record in &records {
        match store.insert(catalog, record) {
            Ok(()) => {
                inserted += 1;
                println!(
                    "{} {} {}",
                    "Inserted".bright_green(),
                    station,
                    record.date_start.stninfo_string()
                );
            }
            Err(e) => print_findings(station, &[e.to_string()]),
        }
    }
    Ok(inserted)
}
