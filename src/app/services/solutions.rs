//! Bulk maintenance of PPP solutions and inventory rows

use crate::Result;
use crate::app::adapters::catalog::{Catalog, RinexTable};
use crate::app::models::{Event, RinexFile, SolutionKey, StationId};
use crate::date::DateRange;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ExclusionReport {
    pub excluded: usize,
    pub already_excluded: Vec<SolutionKey>,
}

/// Put every PPP solution of `station` in `range` into the exclusion table
pub fn exclude_solutions(
    catalog: &mut dyn Catalog,
    station: &StationId,
    range: &DateRange,
) -> Result<ExclusionReport> {
    let mut report = ExclusionReport::default();
    for solution in catalog.ppp_solutions(station, range)? {
        let key = solution.key();
        if catalog.exclude_solution(&key)? {
            report.excluded += 1;
        } else {
            info!(
                "PPP solution for {} {} {:03} is already in the excluded solutions table",
                station, key.year, key.doy
            );
            report.already_excluded.push(key);
        }
    }
    Ok(report)
}

/// A row that could not be deleted and why
#[derive(Debug, Clone)]
pub struct DeleteFailure {
    pub file: RinexFile,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct DeletionReport {
    pub deleted: Vec<RinexFile>,
    pub failed: Vec<DeleteFailure>,
}

/// Delete inventory rows whose fractional year lies in `range` and whose
/// completion is at most `completion_limit`
///
/// Every row goes in its own transaction with one audit event; a row that
/// fails is reported and the others still go.
pub fn delete_rinex(
    catalog: &mut dyn Catalog,
    station: &StationId,
    range: &DateRange,
    completion_limit: f64,
) -> Result<DeletionReport> {
    let (first, last) = (range.start.fyear(), range.end.fyear());
    let rows: Vec<RinexFile> = catalog
        .rinex_in_range(station, range, RinexTable::Archive)?
        .into_iter()
        .filter(|r| r.observation_fyear >= first && r.observation_fyear <= last)
        .filter(|r| r.completion <= completion_limit)
        .collect();

    info!(
        "Deleting {} RINEX files and solutions for {} between {} and completion <= {:.3}",
        rows.len(),
        station,
        range,
        completion_limit
    );

    let mut report = DeletionReport::default();
    for row in rows {
        match delete_row(catalog, &row, completion_limit) {
            Ok(()) => report.deleted.push(row),
            Err(e) => {
                warn!(
                    "Failed to delete solutions and/or RINEX files for {} {:03}: {}",
                    row.observation_year, row.observation_doy, e
                );
                report.failed.push(DeleteFailure {
                    file: row,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

fn delete_row(catalog: &mut dyn Catalog, row: &RinexFile, completion_limit: f64) -> Result<()> {
    let event = Event::info(format!(
        "RINEX file {} (completion {:.3} <= {:.3}) and its solutions were deleted from the database",
        row.filename, row.completion, completion_limit
    ))
    .with_station(&row.station)
    .with_date(&row.date());

    catalog.begin()?;
    let outcome = catalog
        .remove_rinex(row)
        .and_then(|_| catalog.insert_event(&event))
        .and_then(|_| catalog.commit());
    if outcome.is_err() {
        catalog.rollback()?;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adapters::memory_catalog::{CatalogState, MemoryConnector};
    use crate::app::models::PppSolution;
    use crate::date::GnssDate;

    fn day(doy: u32) -> GnssDate {
        GnssDate::from_year_doy(2022, doy).unwrap()
    }

    fn station() -> StationId {
        StationId::new("sam", "unsa")
    }

    fn row(doy: u32, completion: f64) -> RinexFile {
        RinexFile::new(station(), day(doy), day(doy).at_time(12, 0, 0).unwrap(), format!("unsa{:03}0.22o", doy))
            .unwrap()
            .with_completion(completion)
    }

    fn create_test_connector() -> MemoryConnector {
        let mut state = CatalogState::default();
        state.rinex = vec![row(10, 0.2), row(11, 0.9), row(12, 0.4), row(40, 0.1)];
        state.ppp_solutions = (10..=12)
            .map(|doy| PppSolution::new(station(), 2022, doy, [0.0, 0.0, 6_378_137.0]))
            .collect();
        MemoryConnector::new(state)
    }

    #[test]
    fn test_exclude_reports_duplicates() {
        let connector = create_test_connector();
        let mut catalog = connector.catalog();
        let range = DateRange::new(day(1), day(11)).unwrap();

        let first = exclude_solutions(&mut catalog, &station(), &range).unwrap();
        assert_eq!(first.excluded, 2);
        assert!(first.already_excluded.is_empty());

        let wider = DateRange::new(day(1), day(30)).unwrap();
        let second = exclude_solutions(&mut catalog, &station(), &wider).unwrap();
        assert_eq!(second.excluded, 1);
        assert_eq!(second.already_excluded.len(), 2);
    }

    #[test]
    fn test_delete_by_completion_limit() {
        let connector = create_test_connector();
        let mut catalog = connector.catalog();
        let range = DateRange::new(day(1), day(30)).unwrap();

        let report = delete_rinex(&mut catalog, &station(), &range, 0.5).unwrap();
        let deleted: Vec<u32> = report.deleted.iter().map(|r| r.observation_doy).collect();
        assert_eq!(deleted, vec![10, 12]);
        assert!(report.failed.is_empty());

        let state = connector.snapshot().unwrap();
        assert_eq!(state.rinex.len(), 2);
        assert_eq!(state.ppp_solutions.len(), 1);
        assert_eq!(state.events.len(), 2);
    }
}
