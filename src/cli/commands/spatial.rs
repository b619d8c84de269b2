//! Spatial coherence command

use crate::Result;
use crate::app::adapters::catalog::CatalogConnector;
use crate::app::services::spatial::{Disposition, SpatialResolver, check_spatial_coherence};
use crate::cli::args::SpatialArgs;
use crate::cli::commands::shared::{CheckStats, CommandContext, print_findings};
use std::sync::Arc;
use tracing::info;

/// Match every PPP solution against the station coordinates
pub async fn run_spatial(args: &SpatialArgs) -> Result<CheckStats> {
    let context = CommandContext::prepare(&args.common)?;
    let stations = context.connector.connect()?.stations()?;
    let resolver = Arc::new(SpatialResolver::new(
        &stations,
        context.config.spatial.tolerance_m,
    ));
    info!(
        "Resolving PPP solutions within {:.1} m, disposition {:?}",
        resolver.tolerance_m(),
        args.disposition
    );

    let range = context.range;
    let disposition = args.disposition;
    let stats = context
        .run_per_station(
            "Checking PPP solution positions",
            move |catalog, station| {
                check_spatial_coherence(catalog, resolver.as_ref(), station, &range, disposition)
            },
            |station, report| {
                let mut findings: Vec<String> =
                    report.findings.iter().map(|f| f.describe()).collect();
                if report.excluded > 0 {
                    findings.push(format!("{} solutions excluded", report.excluded));
                }
                if report.deleted > 0 {
                    findings.push(format!("{} solutions deleted", report.deleted));
                }
                print_findings(station, &findings);
                report.findings.len()
            },
        )
        .await?;

    if disposition != Disposition::Noop && stats.findings > 0 {
        context.persist()?;
    }
    Ok(stats)
}
