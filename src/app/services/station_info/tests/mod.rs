//! Shared fixtures for station-info tests

use crate::app::adapters::memory_catalog::{CatalogState, MemoryConnector};
use crate::app::models::{RinexFile, Station, StationId, StationInfoRecord};
use crate::date::GnssDate;


pub const RECEIVER: &str = "TRIMBLE NETR9";
pub const ANTENNA: &str = "TRM57971.00";

/// Day of year 2020 at 00:00:00
pub fn day(doy: u32) -> GnssDate {
    GnssDate::from_year_doy(2020, doy).unwrap()
}

pub fn test_station() -> StationId {
    StationId::new("igs", "braz")
}

/// Record from `start` to `end` (day of year 2020), open when `end` is `None`
pub fn create_test_record(start: u32, end: Option<u32>) -> StationInfoRecord {
    StationInfoRecord::new(test_station(), day(start), RECEIVER, ANTENNA)
        .with_date_end(end.map(day))
        .with_receiver_serial("5029K00001")
}

/// Catalog holding the given records, with the test receiver and antenna registered
pub fn create_test_connector(records: Vec<StationInfoRecord>) -> MemoryConnector {
    let mut state = CatalogState::default();
    state.stations.push(Station::new(test_station()));
    state.station_info = records;
    state.receivers.insert(RECEIVER.to_string());
    state.antennas.insert(ANTENNA.to_string());
    MemoryConnector::new(state)
}

/// One full-day RINEX file reported by the given receiver/antenna
pub fn create_test_rinex(doy: u32, receiver_serial: &str, antenna: &str) -> RinexFile {
    RinexFile::new(
        test_station(),
        day(doy),
        day(doy).at_time(23, 59, 30).unwrap(),
        format!("braz{:03}0.20o", doy),
    )
    .unwrap()
    .with_receiver(RECEIVER, receiver_serial, "4.85")
    .with_antenna(antenna, "1441035", "NONE", 0.0083)
}
