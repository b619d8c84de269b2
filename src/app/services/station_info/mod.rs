//! Station-info interval store
//!
//! Holds the ordered station-info history of one station, answers "which
//! record was active at time T" and applies validated mutations to the
//! catalog. The store is a short-lived session object: it is loaded fresh from
//! the catalog for every query and reloaded after each mutation, because other
//! writers may commit between two operations.
//!
//! Violations of the interval invariants (overlaps, several open records,
//! gaps) are reported, never repaired.

use crate::app::adapters::catalog::Catalog;
use crate::app::models::{StationId, StationInfoRecord};
use crate::date::GnssDate;
use crate::{Error, Result};
use tracing::{debug, warn};

pub mod atx;
pub mod format;
pub mod interval;
pub mod proposal;

#[cfg(test)]
pub mod tests;

pub use atx::{AntennaCalibrations, CalibrationChecker, Frame};
pub use format::{StationInfoFormat, format_record, parse_stninfo_line};
pub use interval::Interval;
pub use proposal::propose_from_observations;

/// Station-info history of one station
#[derive(Debug, Clone)]
pub struct StationInfoStore {
    station: StationId,
    records: Vec<StationInfoRecord>,
    as_of: Option<GnssDate>,
    current: Option<StationInfoRecord>,
}

impl StationInfoStore {
    /// Load every record of `station`, ordered by DateStart
    ///
    /// # Arguments
    /// * `as_of` - also resolve the record active at this date
    /// * `allow_empty` - accept a station without records
    ///
    /// # Returns
    /// * `Err(Error::NotFound)` - no records and `allow_empty` is false
    /// * `Err(Error::NoApplicableRecord)` - `as_of` is outside every interval
    pub fn load(
        catalog: &dyn Catalog,
        station: &StationId,
        as_of: Option<&GnssDate>,
        allow_empty: bool,
    ) -> Result<Self> {
        let records = catalog.station_info_records(station)?;
        if records.is_empty() && !allow_empty {
            return Err(Error::not_found(format!(
                "No station info records for {}",
                station
            )));
        }

        let mut store = Self {
            station: station.clone(),
            records,
            as_of: as_of.copied(),
            current: None,
        };

        if let Some(date) = as_of {
            if !store.records.is_empty() {
                store.current = Some(store.record_at(date)?.clone());
            }
        }

        debug!("Loaded {} station info records for {}", store.records.len(), station);
        Ok(store)
    }

    pub fn station(&self) -> &StationId {
        &self.station
    }

    /// Records ordered by DateStart ascending
    pub fn records(&self) -> &[StationInfoRecord] {
        &self.records
    }

    /// Record resolved by the `as_of` date given to [`StationInfoStore::load`]
    pub fn current(&self) -> Option<&StationInfoRecord> {
        self.current.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record whose interval contains `date`
    ///
    /// Containment is inclusive at both ends; when two back-to-back records
    /// share the boundary the later one (latest DateStart) wins.
    pub fn record_at(&self, date: &GnssDate) -> Result<&StationInfoRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.covers(date))
            .ok_or_else(|| Error::no_applicable_record(&self.station, date.stninfo_string()))
    }

    /// Other loaded records whose interval intersects `record`'s interval
    pub fn overlaps(&self, record: &StationInfoRecord) -> Vec<&StationInfoRecord> {
        interval::overlapping(&self.records, record)
    }

    /// Records with an open DateEnd
    pub fn open_records(&self) -> Vec<&StationInfoRecord> {
        self.records.iter().filter(|r| r.is_open()).collect()
    }

    /// Every pair of intersecting records
    pub fn conflicts(&self) -> Vec<(&StationInfoRecord, &StationInfoRecord)> {
        interval::conflicting_pairs(&self.records)
    }

    /// Holes between consecutive records longer than one second
    pub fn gaps(&self) -> Vec<(GnssDate, GnssDate)> {
        interval::gaps_between(&self.records)
    }

    pub fn first(&self) -> Option<&StationInfoRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&StationInfoRecord> {
        self.records.last()
    }

    /// Insert a record that must not intersect any existing record
    pub fn insert(&mut self, catalog: &mut dyn Catalog, record: &StationInfoRecord) -> Result<()> {
        self.validate_candidate(&*catalog, record, None)?;
        catalog.insert_station_info(record)?;
        debug!(
            "Inserted station info for {} starting {}",
            self.station,
            record.date_start.stninfo_string()
        );
        self.reload(&*catalog)
    }

    /// Replace `old` with `new`; `new` is checked against the other records only
    pub fn update(
        &mut self,
        catalog: &mut dyn Catalog,
        old: &StationInfoRecord,
        new: &StationInfoRecord,
    ) -> Result<()> {
        self.require_loaded(old)?;
        self.validate_candidate(&*catalog, new, Some(old))?;
        catalog.update_station_info(old, new)?;
        self.reload(&*catalog)
    }

    pub fn delete(&mut self, catalog: &mut dyn Catalog, record: &StationInfoRecord) -> Result<()> {
        self.require_loaded(record)?;
        catalog.delete_station_info(record)?;
        self.reload(&*catalog)?;

        let remaining = self.conflicts().len();
        if remaining > 0 {
            warn!(
                "{} still has {} conflicting station info pairs after the delete",
                self.station, remaining
            );
        }
        Ok(())
    }

    /// Re-read the records from the catalog, re-resolving the current record
    /// against the `as_of` date the store was loaded with
    pub fn reload(&mut self, catalog: &dyn Catalog) -> Result<()> {
        self.records = catalog.station_info_records(&self.station)?;
        if let Some(date) = self.as_of {
            self.current = self.record_at(&date).ok().cloned();
        }
        Ok(())
    }

    fn require_loaded(&self, record: &StationInfoRecord) -> Result<()> {
        if self
            .records
            .iter()
            .any(|r| r.date_start == record.date_start && r.station == record.station)
        {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "Station info for {} starting {}",
                record.station,
                record.date_start.stninfo_string()
            )))
        }
    }

    /// Field, code and interval validation of a record about to be written
    fn validate_candidate(
        &self,
        catalog: &dyn Catalog,
        record: &StationInfoRecord,
        replacing: Option<&StationInfoRecord>,
    ) -> Result<()> {
        if record.station != self.station {
            return Err(Error::validation(format!(
                "Record for {} cannot be stored in the history of {}",
                record.station, self.station
            )));
        }
        record.validate()?;

        if !catalog.receiver_exists(&record.receiver_code)? {
            return Err(Error::validation(format!(
                "Unknown receiver code '{}'",
                record.receiver_code
            )));
        }
        if !catalog.antenna_exists(&record.antenna_code)? {
            return Err(Error::validation(format!(
                "Unknown antenna code '{}'",
                record.antenna_code
            )));
        }

        let others: Vec<StationInfoRecord> = self
            .records
            .iter()
            .filter(|r| replacing.is_none_or(|old| old.date_start != r.date_start))
            .cloned()
            .collect();

        // a new record may not reuse the DateStart of a record it does not replace
        let same_start = others.iter().any(|r| r.date_start == record.date_start);
        let overlaps = interval::overlapping(&others, record);
        if same_start || !overlaps.is_empty() {
            let mut described: Vec<String> = overlaps
                .iter()
                .map(|r| {
                    format!(
                        "[{} -> {}]",
                        r.date_start.stninfo_string(),
                        crate::date::format_stninfo_datetime(r.date_end.as_ref())
                    )
                })
                .collect();
            if same_start {
                described.push(format!("[starting {}]", record.date_start.stninfo_string()));
            }
            return Err(Error::interval_conflict(
                &self.station,
                format!(
                    "record [{} -> {}] overlaps {}",
                    record.date_start.stninfo_string(),
                    crate::date::format_stninfo_datetime(record.date_end.as_ref()),
                    described.join(", ")
                ),
            ));
        }
        Ok(())
    }
}
