//! Coverage gaps in the observation timeline and their text chart

use crate::Result;
use crate::app::adapters::catalog::{Catalog, RinexTable};
use crate::app::models::StationId;
use crate::constants::{GAP_CHART_DAYS_PER_GLYPH, GAP_CHART_LINES, GAP_CHART_WRAP_DAYS};
use crate::date::{DateRange, GnssDate};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Run of consecutive days without an inventory row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub start: GnssDate,
    pub end: GnssDate,
}

impl Gap {
    pub fn days(&self) -> i64 {
        self.start.days_until(&self.end) + 1
    }
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({} days)", self.start, self.end, self.days())
    }
}

/// Days of `range` (inclusive) whose MJD is not in `observed`
pub fn missing_days(observed: &BTreeSet<i64>, range: &DateRange) -> Vec<GnssDate> {
    let (first, last) = range.mjd_bounds();
    (first..=last)
        .filter(|mjd| !observed.contains(mjd))
        .map(GnssDate::from_mjd)
        .collect()
}

/// Observed days and missing days of a station inside `range`
///
/// The range is clipped to the first and last observed day, so no gap is
/// reported before the station started or after it stopped recording.
#[derive(Debug, Clone, Default)]
pub struct GapScan {
    pub observed: BTreeSet<i64>,
    pub span: Option<DateRange>,
    pub missing: Vec<GnssDate>,
}

pub fn find_gaps(catalog: &dyn Catalog, station: &StationId, range: &DateRange) -> Result<GapScan> {
    let observed: BTreeSet<i64> = catalog
        .rinex_in_range(station, range, RinexTable::Processed)?
        .iter()
        .map(|r| r.date().mjd())
        .collect();

    let (Some(first), Some(last)) = (observed.first(), observed.last()) else {
        return Ok(GapScan::default());
    };
    let span = DateRange::new(GnssDate::from_mjd(*first), GnssDate::from_mjd(*last))?;
    let missing = missing_days(&observed, &span);

    Ok(GapScan {
        observed,
        span: Some(span),
        missing,
    })
}

/// Collapse consecutive missing days into gaps, keeping runs longer than `ignore_days`
pub fn coalesce_gaps(missing: &[GnssDate], ignore_days: i64) -> Vec<Gap> {
    let mut sorted: Vec<GnssDate> = missing.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut runs: Vec<Gap> = Vec::new();
    for day in sorted {
        match runs.last_mut() {
            Some(run) if run.end.mjd() + 1 == day.mjd() => run.end = day,
            _ => runs.push(Gap { start: day, end: day }),
        }
    }
    runs.retain(|g| g.days() > ignore_days);
    runs
}

// =============================================================================
// Gap Chart
// =============================================================================

fn glyph(first: bool, second: Option<bool>) -> char {
    match (first, second.unwrap_or(false)) {
        (true, true) => '█',
        (true, false) => '▌',
        (false, true) => '▐',
        (false, false) => ' ',
    }
}

/// Per-year chart of observed days, two days per glyph
///
/// Every year inside `span` gets a `YYYY:` heading followed by lines of the
/// form `    DDD>glyphs<DDD`. A year with more than 240 charted days is split
/// over four lines.
pub fn render_gap_chart(station: &StationId, observed: &BTreeSet<i64>, span: &DateRange) -> String {
    let mut out = format!(
        " -- {}: (First and last observation in timespan: {} - {})\n",
        station, span.start, span.end
    );

    let mut years: BTreeMap<i32, Vec<GnssDate>> = BTreeMap::new();
    let (first, last) = span.mjd_bounds();
    for mjd in first..=last {
        let day = GnssDate::from_mjd(mjd);
        years.entry(day.year()).or_default().push(day);
    }

    for (year, days) in years {
        out.push_str(&format!("\n{}:\n", year));

        let cells: Vec<(u32, u32, char)> = days
            .chunks(GAP_CHART_DAYS_PER_GLYPH)
            .map(|pair| {
                let present = |d: &GnssDate| observed.contains(&d.mjd());
                let second = pair.get(1);
                let last_doy = second.unwrap_or(&pair[0]).doy();
                (
                    pair[0].doy(),
                    last_doy,
                    glyph(present(&pair[0]), second.map(present)),
                )
            })
            .collect();

        let per_line = if days.len() > GAP_CHART_WRAP_DAYS {
            cells.len().div_ceil(GAP_CHART_LINES)
        } else {
            cells.len()
        };

        for line in cells.chunks(per_line.max(1)) {
            let glyphs: String = line.iter().map(|(_, _, g)| *g).collect();
            let first_doy = line.first().map_or(0, |c| c.0);
            let last_doy = line.last().map_or(0, |c| c.1);
            out.push_str(&format!("    {:03}>{}<{:03}\n", first_doy, glyphs, last_doy));
        }
    }
    out
}
