//! Receiver serial numbers: inventory versus station info

use crate::Result;
use crate::app::adapters::catalog::{Catalog, RinexTable};
use crate::app::models::StationId;
use crate::app::services::station_info::StationInfoStore;
use crate::date::{DateRange, GnssDate};
use std::fmt;

/// One day whose RINEX header disagrees with the station info
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialMismatch {
    pub date: GnssDate,
    pub observed: String,
    pub declared: String,
}

/// Consecutive days sharing the same mismatched pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchRun {
    pub start: GnssDate,
    pub end: GnssDate,
    pub observed: String,
    pub declared: String,
    pub days: usize,
}

impl fmt::Display for MismatchRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "from {} to {}: RINEX SN {} != Station Information {}. Possible change in station or \
             bad RINEX metadata.",
            self.start, self.end, self.observed, self.declared
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct SerialReport {
    pub checked: usize,
    pub runs: Vec<MismatchRun>,
    /// Session midpoints no station-info record covers
    pub unresolved: Vec<GnssDate>,
}

/// Sort by date and collapse consecutive days with an identical pair into runs
pub fn coalesce_mismatches(mut mismatches: Vec<SerialMismatch>) -> Vec<MismatchRun> {
    mismatches.sort_by_key(|m| m.date);

    let mut runs: Vec<MismatchRun> = Vec::new();
    for mismatch in mismatches {
        match runs.last_mut() {
            Some(run)
                if run.end.mjd() + 1 == mismatch.date.mjd()
                    && run.observed == mismatch.observed
                    && run.declared == mismatch.declared =>
            {
                run.end = mismatch.date;
                run.days += 1;
            }
            _ => runs.push(MismatchRun {
                start: mismatch.date,
                end: mismatch.date,
                observed: mismatch.observed,
                declared: mismatch.declared,
                days: 1,
            }),
        }
    }
    runs
}

/// Compare each processed row's receiver serial with the record active at the
/// session midpoint, case-insensitively
pub fn verify_receiver_serial(
    catalog: &dyn Catalog,
    station: &StationId,
    range: &DateRange,
) -> Result<SerialReport> {
    let rows = catalog.rinex_in_range(station, range, RinexTable::Processed)?;
    let store = StationInfoStore::load(catalog, station, None, true)?;

    let mut report = SerialReport {
        checked: rows.len(),
        ..SerialReport::default()
    };
    let mut mismatches = Vec::new();

    for row in &rows {
        let midpoint = row.session_midpoint();
        match store.record_at(&midpoint) {
            Ok(record) => {
                let observed = row.receiver_serial.to_lowercase();
                let declared = record.receiver_serial.to_lowercase();
                if observed != declared {
                    mismatches.push(SerialMismatch {
                        date: midpoint.start_of_day(),
                        observed,
                        declared,
                    });
                }
            }
            Err(e) if e.is_not_found() => report.unresolved.push(midpoint),
            Err(e) => return Err(e),
        }
    }

    report.runs = coalesce_mismatches(mismatches);
    Ok(report)
}
