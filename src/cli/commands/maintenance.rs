//! Catalog maintenance commands: station rename, solution exclusion and
//! inventory deletion

use crate::Result;
use crate::app::adapters::archive::FsArchive;
use crate::app::adapters::catalog::CatalogConnector;
use crate::app::services::solutions::{delete_rinex, exclude_solutions};
use crate::app::services::station_merge::merge_station;
use crate::cli::args::{DeleteRinexArgs, ExcludeArgs, RenameArgs};
use crate::cli::commands::shared::{CheckStats, CommandContext, print_findings};
use colored::*;
use std::time::Instant;
use tracing::info;

/// Move one station's files and inventory to `--dest`
///
/// Runs on the calling task: files are migrated one at a time, each in its
/// own transaction.
pub async fn run_rename(args: &RenameArgs) -> Result<CheckStats> {
    args.validate()?;
    let start_time = Instant::now();
    let context = CommandContext::prepare(&args.common)?;
    let archive = FsArchive::new(context.config.archive.root.clone());
    let mut catalog = context.connector.connect()?;

    let mut stats = CheckStats {
        stations_checked: context.stations.len(),
        ..CheckStats::default()
    };
    for source in &context.stations {
        info!("Renaming {} to {} ({})", source, args.dest, context.range);
        match merge_station(catalog.as_mut(), &archive, source, &args.dest, &context.range) {
            Ok(report) => {
                for moved in &report.moved {
                    println!(
                        "{} {} -> {}",
                        moved.date.yyyyddd(),
                        moved.from.display(),
                        moved.to.display()
                    );
                }
                for start in &report.stninfo_copied {
                    println!(
                        "{} station info {} copied to {}",
                        "Created".bright_green(),
                        start.stninfo_string(),
                        args.dest
                    );
                }
                print_findings(source, &report.warnings);
                stats.findings += report.moved.len();
            }
            Err(e) => {
                stats.stations_failed += 1;
                eprintln!("{} {}", format!("{}:", source).bright_red().bold(), e);
            }
        }
    }

    context.persist()?;
    stats.processing_time = start_time.elapsed();
    Ok(stats)
}

/// Add every PPP solution in `--range` to the exclusion table
pub async fn run_exclude_solutions(args: &ExcludeArgs) -> Result<CheckStats> {
    let context = CommandContext::prepare(&args.common)?;
    let range = args.solution_range()?;
    let stats = context
        .run_per_station(
            "Excluding PPP solutions",
            move |catalog, station| exclude_solutions(catalog, station, &range),
            |station, report| {
                if report.excluded > 0 {
                    println!("{}: {} solutions excluded", station, report.excluded);
                }
                if !report.already_excluded.is_empty() {
                    println!(
                        "{}: {} solutions were already excluded",
                        station,
                        report.already_excluded.len()
                    );
                }
                report.excluded
            },
        )
        .await?;

    if stats.findings > 0 {
        context.persist()?;
    }
    Ok(stats)
}

/// Delete inventory rows in `--range` at or below `--completion`
pub async fn run_delete_rinex(args: &DeleteRinexArgs) -> Result<CheckStats> {
    args.validate()?;
    let context = CommandContext::prepare(&args.common)?;
    let range = args.deletion_range()?;
    let limit = args.completion;
    let stats = context
        .run_per_station(
            "Deleting RINEX files",
            move |catalog, station| delete_rinex(catalog, station, &range, limit),
            |station, report| {
                for row in &report.deleted {
                    println!(
                        "{}: deleted {} (completion {:.3})",
                        station, row.filename, row.completion
                    );
                }
                let failures: Vec<String> = report
                    .failed
                    .iter()
                    .map(|f| format!("{}: {}", f.file.filename, f.reason))
                    .collect();
                print_findings(station, &failures);
                report.deleted.len()
            },
        )
        .await?;

    if stats.findings > 0 {
        context.persist()?;
    }
    Ok(stats)
}
