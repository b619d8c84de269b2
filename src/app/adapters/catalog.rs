//! Catalog interface consumed by the integrity services
//!
//! The catalog is the relational store holding stations, station-info
//! records, the RINEX inventory, PPP solutions and audit events. Services only
//! see the [`Catalog`] trait; each worker obtains its own handle from a
//! [`CatalogConnector`] because handles and their transactions are never
//! shared between concurrent checks.

use crate::Result;
use crate::app::models::{
    Event, PppSolution, RinexFile, SolutionKey, Station, StationId, StationInfoRecord,
};
use crate::date::{DateRange, GnssDate};

/// Which view of the inventory a query reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RinexTable {
    /// Every file in the archive, several per day possible
    Archive,
    /// One file per station-day, the one with the best completion
    Processed,
}

/// Connection to the catalog
///
/// Station-info queries return records ordered by DateStart ascending and
/// inventory queries return rows ordered by session start. Writes outside a
/// transaction are committed immediately.
pub trait Catalog: Send {
    // ==================== Stations ====================

    /// All stations, including temporary networks
    fn stations(&self) -> Result<Vec<Station>>;

    fn station(&self, id: &StationId) -> Result<Option<Station>>;

    // ==================== Station Info ====================

    fn station_info_records(&self, id: &StationId) -> Result<Vec<StationInfoRecord>>;

    fn insert_station_info(&mut self, record: &StationInfoRecord) -> Result<()>;

    /// Replace the record identified by `old` (station and DateStart)
    fn update_station_info(
        &mut self,
        old: &StationInfoRecord,
        new: &StationInfoRecord,
    ) -> Result<()>;

    fn delete_station_info(&mut self, record: &StationInfoRecord) -> Result<()>;

    fn antenna_exists(&self, antenna_code: &str) -> Result<bool>;

    fn receiver_exists(&self, receiver_code: &str) -> Result<bool>;

    // ==================== Inventory ====================

    /// Inventory rows whose observation day lies in `range`
    fn rinex_in_range(
        &self,
        id: &StationId,
        range: &DateRange,
        table: RinexTable,
    ) -> Result<Vec<RinexFile>>;

    /// Processed rows whose session start is strictly between the two dates
    fn rinex_count_between(&self, id: &StationId, after: &GnssDate, before: &GnssDate)
    -> Result<usize>;

    /// First and last session start in the processed view
    fn rinex_time_span(&self, id: &StationId) -> Result<Option<(GnssDate, GnssDate)>>;

    /// Remove an inventory row together with the solutions computed from it
    fn remove_rinex(&mut self, file: &RinexFile) -> Result<()>;

    /// Reassign an inventory row to another station under a new filename
    fn rename_rinex(&mut self, file: &RinexFile, dest: &StationId, filename: &str) -> Result<()>;

    // ==================== Solutions ====================

    fn ppp_solutions(&self, id: &StationId, range: &DateRange) -> Result<Vec<PppSolution>>;

    /// Returns `false` when the solution was already excluded
    fn exclude_solution(&mut self, key: &SolutionKey) -> Result<bool>;

    /// Returns `false` when no solution matched
    fn delete_solution(&mut self, key: &SolutionKey) -> Result<bool>;

    // ==================== Events ====================

    fn insert_event(&mut self, event: &Event) -> Result<()>;

    // ==================== Transactions ====================

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;
}

/// Opens independent catalog handles
pub trait CatalogConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Catalog>>;
}
