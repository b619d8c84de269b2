//! RINEX inventory commands: archive presence, serial checks, gaps and counts

use crate::Result;
use crate::app::adapters::archive::FsArchive;
use crate::app::adapters::catalog::CatalogConnector;
use crate::app::services::rinex_reconciler::{
    coalesce_gaps, count_daily_rinex, find_gaps, render_gap_chart, verify_archive_presence,
    verify_receiver_serial,
};
use crate::cli::args::{CommonArgs, IgnoreDaysArgs};
use crate::cli::commands::shared::{CheckStats, CommandContext, print_findings};
use colored::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Remove inventory rows whose archive file is gone
pub async fn run_check_rinex(args: &CommonArgs) -> Result<CheckStats> {
    let context = CommandContext::prepare(args)?;
    let archive = Arc::new(FsArchive::new(context.config.archive.root.clone()));
    info!("Checking archive presence under {}", archive.root().display());

    let range = context.range;
    let stats = context
        .run_per_station(
            "Checking RINEX files in the archive",
            move |catalog, station| verify_archive_presence(catalog, archive.as_ref(), station, &range),
            |station, report| {
                let findings: Vec<String> = report
                    .removed
                    .iter()
                    .map(|path| {
                        format!(
                            "{} missing from the archive, inventory row removed",
                            path.display()
                        )
                    })
                    .collect();
                print_findings(station, &findings);
                findings.len()
            },
        )
        .await?;

    if stats.findings > 0 {
        context.persist()?;
    }
    Ok(stats)
}

/// Compare header receiver serials with station information
pub async fn run_stninfo_rinex(args: &CommonArgs) -> Result<CheckStats> {
    let context = CommandContext::prepare(args)?;
    let range = context.range;
    context
        .run_per_station(
            "Comparing RINEX serials with station info",
            move |catalog, station| verify_receiver_serial(catalog, station, &range),
            |station, report| {
                let mut findings: Vec<String> = report.runs.iter().map(|run| run.to_string()).collect();
                if !report.unresolved.is_empty() {
                    findings.push(format!(
                        "{} RINEX files could not be matched to a station info record",
                        report.unresolved.len()
                    ));
                }
                print_findings(station, &findings);
                findings.len()
            },
        )
        .await
}

/// List runs of missing days longer than `ignore_days`
pub async fn run_gaps(args: &IgnoreDaysArgs) -> Result<CheckStats> {
    let context = CommandContext::prepare(&args.common)?;
    let range = context.range;
    let ignore_days = args.ignore_days;
    context
        .run_per_station(
            "Looking for gaps in the RINEX record",
            move |catalog, station| find_gaps(catalog, station, &range),
            move |station, scan| {
                let findings: Vec<String> = coalesce_gaps(&scan.missing, ignore_days)
                    .iter()
                    .map(|gap| format!("Gap: {}", gap))
                    .collect();
                print_findings(station, &findings);
                findings.len()
            },
        )
        .await
}

/// Draw the observed-days chart of every station
pub async fn run_gap_chart(args: &CommonArgs) -> Result<CheckStats> {
    let context = CommandContext::prepare(args)?;
    let range = context.range;
    context
        .run_per_station(
            "Charting RINEX availability",
            move |catalog, station| find_gaps(catalog, station, &range),
            |station, scan| match &scan.span {
                Some(span) => {
                    println!("{}", render_gap_chart(station, &scan.observed, span));
                    scan.missing.len()
                }
                None => {
                    println!(
                        "{}",
                        format!(" -- {}: no RINEX files in {}", station, range).yellow()
                    );
                    0
                }
            },
        )
        .await
}

/// Processed files per day over every selected station
pub async fn run_rinex_count(args: &CommonArgs) -> Result<CheckStats> {
    let start_time = Instant::now();
    let context = CommandContext::prepare(args)?;
    let catalog = context.connector.connect()?;
    let counts = count_daily_rinex(catalog.as_ref(), &context.stations, &context.range)?;

    println!("{}", " Year Doy  Files".bright_green().bold());
    for ((year, doy), count) in &counts {
        println!(" {} {:03} {:>6}", year, doy, count);
    }

    Ok(CheckStats {
        stations_checked: context.stations.len(),
        findings: counts.values().sum(),
        processing_time: start_time.elapsed(),
        ..CheckStats::default()
    })
}
