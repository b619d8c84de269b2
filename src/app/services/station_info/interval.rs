//! Interval arithmetic over station-info records
//!
//! Intervals are half-open `[DateStart, DateEnd)`. An open DateEnd extends
//! indefinitely into the future, so an open record intersects every record
//! that ends after its start.

use crate::app::models::StationInfoRecord;
use crate::constants::STNINFO_GAP_TOLERANCE_SECS;
use crate::date::GnssDate;
use std::cmp::Ordering;

/// Validity interval of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: GnssDate,
    pub end: Option<GnssDate>,
}

impl Interval {
    pub fn new(start: GnssDate, end: Option<GnssDate>) -> Self {
        Self { start, end }
    }

    pub fn of(record: &StationInfoRecord) -> Self {
        Self::new(record.date_start, record.date_end)
    }

    /// `a.start < b.end && b.start < a.end`, with `None` as +infinity
    pub fn intersects(&self, other: &Interval) -> bool {
        starts_before_end(&self.start, other.end.as_ref())
            && starts_before_end(&other.start, self.end.as_ref())
    }

    /// Length in seconds of the hole between `self` and a later interval
    pub fn gap_until(&self, next: &Interval) -> Option<i64> {
        self.end.map(|end| end.seconds_until(&next.start))
    }
}

fn starts_before_end(start: &GnssDate, end: Option<&GnssDate>) -> bool {
    end.is_none_or(|end| start.cmp(end) == Ordering::Less)
}

/// Records of `records` intersecting `candidate`, ignoring the record that
/// shares its DateStart (the candidate itself, or the one it replaces)
pub fn overlapping<'a>(
    records: &'a [StationInfoRecord],
    candidate: &StationInfoRecord,
) -> Vec<&'a StationInfoRecord> {
    let interval = Interval::of(candidate);
    records
        .iter()
        .filter(|r| r.date_start != candidate.date_start)
        .filter(|r| Interval::of(r).intersects(&interval))
        .collect()
}

/// Every intersecting pair, each reported once, in DateStart order
pub fn conflicting_pairs(
    records: &[StationInfoRecord],
) -> Vec<(&StationInfoRecord, &StationInfoRecord)> {
    let mut pairs = Vec::new();
    for (i, first) in records.iter().enumerate() {
        for second in &records[i + 1..] {
            if Interval::of(first).intersects(&Interval::of(second)) {
                pairs.push((first, second));
            }
        }
    }
    pairs
}

/// Holes between consecutive records (sorted by DateStart) longer than the tolerance
pub fn gaps_between(records: &[StationInfoRecord]) -> Vec<(GnssDate, GnssDate)> {
    records
        .windows(2)
        .filter_map(|pair| {
            let (current, next) = (Interval::of(&pair[0]), Interval::of(&pair[1]));
            match current.gap_until(&next) {
                Some(seconds) if seconds > STNINFO_GAP_TOLERANCE_SECS => {
                    current.end.map(|end| (end, next.start))
                }
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(doy: u32) -> GnssDate {
        GnssDate::from_year_doy(2020, doy).unwrap()
    }

    #[test]
    fn test_back_to_back_intervals_do_not_intersect() {
        let a = Interval::new(day(1), Some(day(10)));
        let b = Interval::new(day(10), None);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
        assert_eq!(a.gap_until(&b), Some(0));
    }

    #[test]
    fn test_open_interval_extends_forever() {
        let open = Interval::new(day(5), None);
        assert!(open.intersects(&Interval::new(day(300), Some(day(301)))));
        assert!(open.intersects(&Interval::new(day(1), Some(day(6)))));
        assert!(!open.intersects(&Interval::new(day(1), Some(day(5)))));
        assert!(open.intersects(&Interval::new(day(200), None)));
    }
}
