//! Shared fixtures for reconciler tests

use crate::app::adapters::archive::{Archive, FsArchive};
use crate::app::adapters::memory_catalog::{CatalogState, MemoryConnector};
use crate::app::models::{RinexFile, Station, StationId, StationInfoRecord};
use crate::date::{DateRange, GnssDate};
use std::fs;
use tempfile::TempDir;

pub mod gaps_tests;
pub mod presence_tests;
pub mod serial_tests;

pub const RECEIVER: &str = "LEICA GR25";
pub const ANTENNA: &str = "LEIAR25.R4";

pub fn day(doy: u32) -> GnssDate {
    GnssDate::from_year_doy(2021, doy).unwrap()
}

pub fn range(first: u32, last: u32) -> DateRange {
    DateRange::new(day(first), day(last)).unwrap()
}

pub fn test_station() -> StationId {
    StationId::new("rms", "lpgs")
}

pub fn create_test_rinex(doy: u32, serial: &str) -> RinexFile {
    RinexFile::new(
        test_station(),
        day(doy),
        day(doy).at_time(23, 59, 30).unwrap(),
        format!("lpgs{:03}0.21o", doy),
    )
    .unwrap()
    .with_receiver(RECEIVER, serial, "4.20")
    .with_antenna(ANTENNA, "10001", "LEIT", 0.0)
}

pub fn create_test_record(start: u32, end: Option<u32>, serial: &str) -> StationInfoRecord {
    StationInfoRecord::new(test_station(), day(start), RECEIVER, ANTENNA)
        .with_date_end(end.map(day))
        .with_receiver_serial(serial)
}

pub fn create_test_connector(rinex: Vec<RinexFile>, records: Vec<StationInfoRecord>) -> MemoryConnector {
    let mut state = CatalogState::default();
    state.stations.push(Station::new(test_station()));
    state.rinex = rinex;
    state.station_info = records;
    state.receivers.insert(RECEIVER.to_string());
    state.antennas.insert(ANTENNA.to_string());
    MemoryConnector::new(state)
}

/// Archive in a temp dir holding a file for each given row
pub fn create_test_archive(present: &[&RinexFile]) -> (TempDir, FsArchive) {
    let dir = TempDir::new().unwrap();
    let archive = FsArchive::new(dir.path());
    for file in present {
        let path = archive.absolute(&archive.rinex_path(file));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"RINEX").unwrap();
    }
    (dir, archive)
}
