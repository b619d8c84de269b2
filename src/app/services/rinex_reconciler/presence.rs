//! Archive presence of inventory rows

use crate::Result;
use crate::app::adapters::archive::Archive;
use crate::app::adapters::catalog::{Catalog, RinexTable};
use crate::app::models::{Event, RinexFile, StationId};
use crate::date::DateRange;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Outcome of an archive presence check for one station
#[derive(Debug, Clone, Default)]
pub struct PresenceReport {
    pub station: Option<StationId>,
    pub checked: usize,
    /// Archive-relative paths of the rows that were removed
    pub removed: Vec<PathBuf>,
}

/// Confirm every inventory row of `station` in `range` has its archive file
///
/// Rows whose file is missing are removed (the catalog cascades the removal
/// to dependent solutions) and one audit event is recorded per removal, both
/// in a single transaction.
pub fn verify_archive_presence(
    catalog: &mut dyn Catalog,
    archive: &dyn Archive,
    station: &StationId,
    range: &DateRange,
) -> Result<PresenceReport> {
    let rows = catalog.rinex_in_range(station, range, RinexTable::Archive)?;
    let mut report = PresenceReport {
        station: Some(station.clone()),
        checked: rows.len(),
        removed: Vec::new(),
    };

    for row in rows {
        let path = archive.rinex_path(&row);
        if archive.exists(&path)? {
            continue;
        }

        warn!("{}: {} missing from the archive", station, path.display());
        remove_dangling_row(catalog, &row, &path)?;
        report.removed.push(path);
    }

    debug!(
        "{}: {} inventory rows checked, {} removed",
        station,
        report.checked,
        report.removed.len()
    );
    Ok(report)
}

fn remove_dangling_row(catalog: &mut dyn Catalog, row: &RinexFile, path: &PathBuf) -> Result<()> {
    let event = Event::info(format!(
        "A missing RINEX file was found during RINEX integrity check: {}. It has been removed \
         from the database. Consider rerunning PPP for this station.",
        path.display()
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
