//! RINEX inventory reconciler
//!
//! Walks the inventory of a station and cross-checks it against the physical
//! archive, the station-info history and the calendar:
//!
//! - [`verify_archive_presence`] prunes rows whose file is gone
//! - [`verify_receiver_serial`] diffs header serials against station info
//! - [`find_gaps`] / [`coalesce_gaps`] locate days without observations
//! - [`check_station_info_coverage`] finds observations no record covers

use crate::Result;
use crate::app::adapters::catalog::{Catalog, RinexTable};
use crate::app::models::StationId;
use crate::date::DateRange;
use std::collections::BTreeMap;

pub mod coverage;
pub mod gaps;
pub mod presence;
pub mod serial;

#[cfg(test)]
pub mod tests;

pub use coverage::{
    CoverageReport, StationInfoAudit, UncoveredGap, audit_station_info, check_station_info_coverage,
};
pub use gaps::{Gap, GapScan, coalesce_gaps, find_gaps, missing_days, render_gap_chart};
pub use presence::{PresenceReport, verify_archive_presence};
pub use serial::{MismatchRun, SerialMismatch, SerialReport, coalesce_mismatches, verify_receiver_serial};

/// Processed inventory rows per (year, doy) over a set of stations
pub fn count_daily_rinex(
    catalog: &dyn Catalog,
    stations: &[StationId],
    range: &DateRange,
) -> Result<BTreeMap<(i32, u32), usize>> {
    let mut counts = BTreeMap::new();
    for station in stations {
        for row in catalog.rinex_in_range(station, range, RinexTable::Processed)? {
            *counts
                .entry((row.observation_year, row.observation_doy))
                .or_insert(0) += 1;
        }
    }
    Ok(counts)
}
