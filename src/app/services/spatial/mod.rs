//! Spatial coherence of PPP solutions
//!
//! Each solution position is converted to geodetic coordinates and matched
//! against the declared coordinates of every station. Solutions that do not
//! land on their own station can be excluded or deleted.

use crate::Result;
use crate::app::adapters::catalog::Catalog;
use crate::app::models::{Event, SolutionKey, StationId};
use crate::date::{DateRange, GnssDate};
use tracing::{debug, warn};

pub mod geodesy;
pub mod resolver;

#[cfg(test)]
pub mod tests;

pub use geodesy::{Geodetic, ecef_to_lla, haversine};
pub use resolver::{Candidate, SpatialMatch, SpatialResolver};

/// What to do with solutions that are not confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Disposition {
    /// Insert them into the exclusion table
    Exclude,
    /// Remove them from the catalog
    Delete,
    /// Only report
    #[default]
    Noop,
}

/// A solution whose position did not confirm its station
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialFinding {
    pub key: SolutionKey,
    pub date: GnssDate,
    pub position: Geodetic,
    pub outcome: SpatialMatch,
}

impl SpatialFinding {
    pub fn describe(&self) -> String {
        self.outcome.describe(&self.key.station, &self.date.yyyyddd())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpatialReport {
    pub checked: usize,
    pub findings: Vec<SpatialFinding>,
    pub excluded: usize,
    pub deleted: usize,
}

/// Resolve every PPP solution of `station` in `range` and apply `disposition`
/// to the ones that are not confirmed
pub fn check_spatial_coherence(
    catalog: &mut dyn Catalog,
    resolver: &SpatialResolver,
    station: &StationId,
    range: &DateRange,
    disposition: Disposition,
) -> Result<SpatialReport> {
    let solutions = catalog.ppp_solutions(station, range)?;
    let mut report = SpatialReport {
        checked: solutions.len(),
        ..SpatialReport::default()
    };

    for solution in &solutions {
        let position = ecef_to_lla(solution.x, solution.y, solution.z);
        let outcome = resolver.resolve(position.lat, position.lon, station);
        if outcome.is_confirmed() {
            continue;
        }

        let finding = SpatialFinding {
            key: solution.key(),
            date: solution.date()?,
            position,
            outcome,
        };
        warn!("{}", finding.describe());

        match disposition {
            Disposition::Exclude => {
                if catalog.exclude_solution(&finding.key)? {
                    report.excluded += 1;
                }
            }
            Disposition::Delete => {
                catalog.begin()?;
                let outcome = delete_with_event(catalog, &finding);
                match outcome {
                    Ok(true) => {
                        catalog.commit()?;
                        report.deleted += 1;
                    }
                    Ok(false) => catalog.rollback()?,
                    Err(e) => {
                        catalog.rollback()?;
                        return Err(e);
                    }
                }
            }
            Disposition::Noop => {}
        }
        report.findings.push(finding);
    }

    debug!(
        "{}: {} solutions checked, {} not confirmed",
        station,
        report.checked,
        report.findings.len()
    );
    Ok(report)
}

fn delete_with_event(catalog: &mut dyn Catalog, finding: &SpatialFinding) -> Result<bool> {
    if !catalog.delete_solution(&finding.key)? {
        return Ok(false);
    }
    let event = Event::warning(format!(
        "PPP solution deleted by spatial coherence check: {}",
        finding.describe()
    ))
    .with_station(&finding.key.station)
    .with_date(&finding.date);
    catalog.insert_event(&event)?;
    Ok(true)
}
