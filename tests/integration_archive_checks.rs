//! Integration tests for the archive-facing checks
//!
//! A catalog snapshot on disk and a temp-dir archive are run through the
//! dispatcher the way the CLI does it: one job per station, each on its own
//! catalog connection.

use gnss_integrity::app::adapters::archive::{Archive, FsArchive};
use gnss_integrity::app::adapters::catalog::CatalogConnector;
use gnss_integrity::app::adapters::memory_catalog::{CatalogState, MemoryConnector};
use gnss_integrity::app::models::{RinexFile, Station, StationId, StationInfoRecord};
use gnss_integrity::app::services::dispatcher::{JobDispatcher, ResultOrder};
use gnss_integrity::app::services::rinex_reconciler::{
    audit_station_info, coalesce_gaps, find_gaps, verify_archive_presence, verify_receiver_serial,
};
use gnss_integrity::date::{DateRange, GnssDate};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const RECEIVER: &str = "TRIMBLE NETR9";
const ANTENNA: &str = "TRM57971.00";

fn day(doy: u32) -> GnssDate {
    GnssDate::from_year_doy(2020, doy).unwrap()
}

fn whole_year() -> DateRange {
    DateRange::new(day(1), day(366)).unwrap()
}

fn stations() -> Vec<StationId> {
    vec![
        StationId::new("igs", "braz"),
        StationId::new("igs", "lpgs"),
        StationId::new("rms", "unsa"),
    ]
}

fn rinex(station: &StationId, doy: u32, serial: &str) -> RinexFile {
    RinexFile::new(
        station.clone(),
        day(doy),
        day(doy).at_time(23, 59, 30).unwrap(),
        format!("{}{:03}0.20o", station.station_code, doy),
    )
    .unwrap()
    .with_receiver(RECEIVER, serial, "5.45")
    .with_antenna(ANTENNA, "1441", "NONE", 0.0)
}

/// Ten days for every station; days 4 and 5 of each station are missing on disk
fn create_test_setup() -> (TempDir, TempDir, Vec<RinexFile>) {
    let archive_dir = TempDir::new().unwrap();
    let catalog_dir = TempDir::new().unwrap();
    let archive = FsArchive::new(archive_dir.path());

    let mut state = CatalogState::default();
    state.receivers.insert(RECEIVER.to_string());
    state.antennas.insert(ANTENNA.to_string());

    let mut rows = Vec::new();
    for station in stations() {
        state.stations.push(Station::new(station.clone()));
        state.station_info.push(
            StationInfoRecord::new(station.clone(), day(1), RECEIVER, ANTENNA)
                .with_receiver_serial("5001"),
        );
        for doy in 1..=10 {
            let row = rinex(&station, doy, "5001");
            if doy != 4 && doy != 5 {
                let path = archive.absolute(&archive.rinex_path(&row));
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, b"RINEX").unwrap();
            }
            rows.push(row);
        }
    }
    state.rinex = rows.clone();

    MemoryConnector::new(state)
        .save_to(&catalog_dir.path().join("catalog.json"))
        .unwrap();
    (archive_dir, catalog_dir, rows)
}

#[tokio::test]
async fn test_presence_check_across_stations() {
    let (archive_dir, catalog_dir, _) = create_test_setup();
    let snapshot = catalog_dir.path().join("catalog.json");
    let connector = Arc::new(MemoryConnector::load(&snapshot).unwrap());
    let archive = Arc::new(FsArchive::new(archive_dir.path()));

    let mut dispatcher = JobDispatcher::new(2).with_order(ResultOrder::Submission);
    for station in stations() {
        let connector = Arc::clone(&connector);
        let archive = Arc::clone(&archive);
        dispatcher.submit(station.to_string(), move || {
            let mut catalog = connector.connect()?;
            verify_archive_presence(catalog.as_mut(), archive.as_ref(), &station, &whole_year())
        });
    }

    let mut labels = Vec::new();
    let report = dispatcher
        .wait(|result| labels.push(result.label.clone()))
        .await;

    assert_eq!(report.failure_count(), 0);
    assert_eq!(labels, vec!["igs.braz", "igs.lpgs", "rms.unsa"]);
    for (_, presence) in report.successes() {
        assert_eq!(presence.checked, 10);
        assert_eq!(presence.removed.len(), 2);
    }

    connector.save().unwrap();
    let reloaded = MemoryConnector::load(&snapshot).unwrap().snapshot().unwrap();
    assert_eq!(reloaded.rinex.len(), 24);
    assert_eq!(reloaded.events.len(), 6);
}

#[tokio::test]
async fn test_gaps_follow_presence_pruning() {
    let (archive_dir, _catalog_dir, rows) = create_test_setup();
    let connector = MemoryConnector::new(CatalogState {
        rinex: rows,
        stations: stations().into_iter().map(Station::new).collect(),
        ..CatalogState::default()
    });
    let archive = FsArchive::new(archive_dir.path());
    let station = StationId::new("igs", "lpgs");

    let mut catalog = connector.connect().unwrap();
    let before = find_gaps(catalog.as_ref(), &station, &whole_year()).unwrap();
    assert!(before.missing.is_empty());

    verify_archive_presence(catalog.as_mut(), &archive, &station, &whole_year()).unwrap();
    let after = find_gaps(catalog.as_ref(), &station, &whole_year()).unwrap();
    let gaps = coalesce_gaps(&after.missing, 0);
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].start, day(4));
    assert_eq!(gaps[0].days(), 2);
    assert!(coalesce_gaps(&after.missing, 2).is_empty());
}

#[tokio::test]
async fn test_serial_and_audit_checks_are_isolated_per_station() {
    let (_archive_dir, catalog_dir, _) = create_test_setup();
    let connector =
        Arc::new(MemoryConnector::load(&catalog_dir.path().join("catalog.json")).unwrap());

    // swap the receiver on one station without touching its station info
    {
        let mut state = connector.snapshot().unwrap();
        for row in state.rinex.iter_mut() {
            if row.station.station_code == "unsa" && row.observation_doy >= 7 {
                row.receiver_serial = "7002".to_string();
            }
        }
        let replaced = MemoryConnector::new(state);
        let mut dispatcher = JobDispatcher::new(3).serial(true);
        for station in stations() {
            let replaced = replaced.clone();
            dispatcher.submit(station.to_string(), move || {
                let catalog = replaced.connect()?;
                verify_receiver_serial(catalog.as_ref(), &station, &whole_year())
            });
        }
        let report = dispatcher.wait(|_| {}).await;
        let runs: Vec<usize> = report.successes().map(|(_, r)| r.runs.len()).collect();
        assert_eq!(runs, vec![0, 0, 1]);
    }

    let mut dispatcher = JobDispatcher::new(3);
    for station in stations().into_iter().chain([StationId::new("igs", "none")]) {
        let connector = Arc::clone(&connector);
        dispatcher.submit(station.to_string(), move || {
            let catalog = connector.connect()?;
            audit_station_info(catalog.as_ref(), &station, None)
        });
    }
    let report = dispatcher.wait(|_| {}).await;
    assert_eq!(report.len(), 4);
    assert_eq!(report.failure_count(), 1);
    assert!(report.successes().all(|(_, audit)| audit.is_clean()));
}
