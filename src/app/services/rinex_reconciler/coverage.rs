//! Station-info coverage of the observed timeline

use crate::Result;
use crate::app::adapters::catalog::Catalog;
use crate::app::models::{StationId, StationInfoRecord};
use crate::app::services::station_info::{CalibrationChecker, StationInfoStore};
use crate::constants::STNINFO_GAP_TOLERANCE_SECS;
use crate::date::{GnssDate, format_stninfo_datetime};
use tracing::debug;

/// Interval of a record as shown in diagnostics
fn describe(record: &StationInfoRecord) -> String {
    format!(
        "[{} -> {}]",
        record.date_start.stninfo_string(),
        format_stninfo_datetime(record.date_end.as_ref())
    )
}

/// Hole between two consecutive records that still holds observations
#[derive(Debug, Clone, PartialEq)]
pub struct UncoveredGap {
    pub previous: StationInfoRecord,
    pub next: StationInfoRecord,
    pub rinex_count: usize,
}

impl UncoveredGap {
    pub fn describe(&self) -> String {
        format!(
            "There is a gap with {} RINEX files between the following station information \
             records: {} and {}",
            self.rinex_count,
            describe(&self.previous),
            describe(&self.next)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct CoverageReport {
    /// First observation and the first record's DateStart, when the former is earlier
    pub before_first: Option<(GnssDate, GnssDate)>,
    /// Last observation and the last record's DateEnd, when the former is later
    pub after_last: Option<(GnssDate, GnssDate)>,
    pub uncovered_gaps: Vec<UncoveredGap>,
}

impl CoverageReport {
    pub fn is_clean(&self) -> bool {
        self.before_first.is_none() && self.after_last.is_none() && self.uncovered_gaps.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if let Some((observed, start)) = &self.before_first {
            messages.push(format!(
                "There is at least one RINEX file before the first station information record: \
                 first observation {}, first record starts {}",
                observed.stninfo_string(),
                start.stninfo_string()
            ));
        }
        if let Some((observed, end)) = &self.after_last {
            messages.push(format!(
                "There is at least one RINEX file after the last station information record: \
                 last observation {}, last record ends {}",
                observed.stninfo_string(),
                end.stninfo_string()
            ));
        }
        messages.extend(self.uncovered_gaps.iter().map(UncoveredGap::describe));
        messages
    }
}

/// Compare the observed time span of a station with its station-info history
///
/// Observations before the first record or after a closed last record are
/// out of window. A hole of more than one second between consecutive records
/// is reported when processed rows start inside it and no record resolves
/// at its midpoint.
pub fn check_station_info_coverage(
    catalog: &dyn Catalog,
    store: &StationInfoStore,
) -> Result<CoverageReport> {
    let station = store.station();
    let mut report = CoverageReport::default();

    if let (Some(first), Some(last)) = (store.first(), store.last()) {
        if let Some((first_obs, last_obs)) = catalog.rinex_time_span(station)? {
            if first_obs < first.date_start {
                report.before_first = Some((first_obs, first.date_start));
            }
            if let Some(end) = last.date_end {
                if last_obs > end {
                    report.after_last = Some((last_obs, end));
                }
            }
        }
    }

    for pair in store.records().windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        let Some(end) = previous.date_end else {
            continue;
        };
        if end.seconds_until(&next.date_start) <= STNINFO_GAP_TOLERANCE_SECS {
            continue;
        }

        let rinex_count = catalog.rinex_count_between(station, &end, &next.date_start)?;
        if rinex_count == 0 {
            continue;
        }
        let midpoint = GnssDate::midpoint(&end, &next.date_start);
        if store.record_at(&midpoint).is_err() {
            report.uncovered_gaps.push(UncoveredGap {
                previous: previous.clone(),
                next: next.clone(),
                rinex_count,
            });
        }
    }

    debug!("{}: coverage check found {} problems", station, report.messages().len());
    Ok(report)
}

/// Complete station-info audit of one station
#[derive(Debug, Clone, Default)]
pub struct StationInfoAudit {
    pub station: Option<StationId>,
    /// DateStart of each open record, reported when there is more than one
    pub open_starts: Vec<GnssDate>,
    pub conflicts: Vec<(StationInfoRecord, StationInfoRecord)>,
    pub calibration_problems: Vec<String>,
    pub coverage: CoverageReport,
}

impl StationInfoAudit {
    pub fn is_clean(&self) -> bool {
        self.open_starts.is_empty()
            && self.conflicts.is_empty()
            && self.calibration_problems.is_empty()
            && self.coverage.is_clean()
    }

    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if !self.open_starts.is_empty() {
            let starts: Vec<String> = self.open_starts.iter().map(|d| d.stninfo_string()).collect();
            messages.push(format!(
                "There is more than one station info entry with Session Stop = 9999 999 \
                 Session Start -> {}",
                starts.join(", ")
            ));
        }
        for (a, b) in &self.conflicts {
            messages.push(format!(
                "Station info records {} and {} overlap",
                describe(a),
                describe(b)
            ));
        }
        messages.extend(self.calibration_problems.iter().cloned());
        messages.extend(self.coverage.messages());
        messages
    }
}

/// Open records, overlaps, calibrations and coverage of one station
///
/// The calibration check only runs when `calibrations` has frames configured.
pub fn audit_station_info(
    catalog: &dyn Catalog,
    station: &StationId,
    calibrations: Option<&mut CalibrationChecker>,
) -> Result<StationInfoAudit> {
    let store = StationInfoStore::load(catalog, station, None, false)?;
    let mut audit = StationInfoAudit {
        station: Some(station.clone()),
        ..StationInfoAudit::default()
    };

    let open = store.open_records();
    if open.len() > 1 {
        audit.open_starts = open.iter().map(|r| r.date_start).collect();
    }

    audit.conflicts = store
        .conflicts()
        .into_iter()
        .map(|(a, b)| (a.clone(), b.clone()))
        .collect();

    if let Some(checker) = calibrations.filter(|c| c.has_frames()) {
        for record in store.records() {
            match checker.check(record) {
                Ok(Some(problem)) => audit.calibration_problems.push(problem),
                Ok(None) => {}
                Err(e) => audit.calibration_problems.push(e.to_string()),
            }
        }
    }

    audit.coverage = check_station_info_coverage(catalog, &store)?;
    Ok(audit)
}
