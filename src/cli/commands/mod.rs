//! Command implementations for the gnss-integrity CLI
//!
//! Each group of commands lives in its own module; batch commands run one job
//! per station through the dispatcher and print findings as they arrive.

pub mod maintenance;
pub mod rinex;
pub mod shared;
pub mod spatial;
pub mod station_info;

pub use shared::CheckStats;

use crate::Result;
use crate::cli::args::{Args, Commands};

/// Main command runner
pub async fn run(args: Args) -> Result<CheckStats> {
    let command = args.command;
    shared::setup_logging(command.common())?;

    let stats = match &command {
        Commands::CheckRinex(args) => rinex::run_check_rinex(args).await,
        Commands::RinexCount(args) => rinex::run_rinex_count(args).await,
        Commands::StninfoRinex(args) => rinex::run_stninfo_rinex(args).await,
        Commands::Gaps(args) => rinex::run_gaps(args).await,
        Commands::GapChart(args) => rinex::run_gap_chart(args).await,
        Commands::StninfoCheck(args) => station_info::run_stninfo_check(args).await,
        Commands::StninfoPropose(args) => station_info::run_stninfo_propose(args).await,
        Commands::PrintStninfo(args) => station_info::run_print_stninfo(args).await,
        Commands::StninfoInsert(args) => station_info::run_stninfo_insert(args).await,
        Commands::Spatial(args) => spatial::run_spatial(args).await,
        Commands::Rename(args) => maintenance::run_rename(args).await,
        Commands::ExcludeSolutions(args) => maintenance::run_exclude_solutions(args).await,
        Commands::DeleteRinex(args) => maintenance::run_delete_rinex(args).await,
    }?;

    if !command.common().quiet {
        stats.print_summary(command.name());
    }
    Ok(stats)
}
