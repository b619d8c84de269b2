use super::*;
use crate::app::adapters::catalog::{Catalog, RinexTable};
use crate::app::models::{EventType, PppSolution};
use crate::app::services::rinex_reconciler::verify_archive_presence;
use std::path::PathBuf;

#[test]
fn test_missing_files_are_pruned_with_event() {
    let rows: Vec<RinexFile> = (1..=3).map(|d| create_test_rinex(d, "1830001")).collect();
    let (_dir, archive) = create_test_archive(&[&rows[0], &rows[2]]);
    let connector = create_test_connector(rows.clone(), Vec::new());
    let mut catalog = connector.catalog();

    let report = verify_archive_presence(&mut catalog, &archive, &test_station(), &range(1, 3)).unwrap();

    assert_eq!(report.checked, 3);
    assert_eq!(
        report.removed,
        vec![PathBuf::from("rms/lpgs/2021/002/lpgs0020.21d.Z")]
    );

    let remaining = catalog
        .rinex_in_range(&test_station(), &range(1, 3), RinexTable::Archive)
        .unwrap();
    assert_eq!(remaining.len(), 2);

    let state = connector.snapshot().unwrap();
    assert_eq!(state.events.len(), 1);
    let event = &state.events[0];
    assert_eq!(event.event_type, EventType::Info);
    assert_eq!(event.doy, Some(2));
    assert!(event.description.contains("lpgs0020.21d.Z"));
    assert!(event.description.contains("Consider rerunning PPP"));
}

#[test]
fn test_removal_cascades_to_solutions() {
    let mut state = create_test_connector(vec![create_test_rinex(5, "1830001")], Vec::new())
        .snapshot()
        .unwrap();
    state
        .ppp_solutions
        .push(PppSolution::new(test_station(), 2021, 5, [1.0, 2.0, 3.0]));
    let connector = MemoryConnector::new(state);
    let (_dir, archive) = create_test_archive(&[]);
    let mut catalog = connector.catalog();

    verify_archive_presence(&mut catalog, &archive, &test_station(), &range(1, 10)).unwrap();
    assert!(connector.snapshot().unwrap().ppp_solutions.is_empty());
}

#[test]
fn test_rows_outside_range_untouched() {
    let rows = vec![create_test_rinex(1, "a"), create_test_rinex(20, "a")];
    let (_dir, archive) = create_test_archive(&[]);
    let connector = create_test_connector(rows, Vec::new());
    let mut catalog = connector.catalog();

    let report = verify_archive_presence(&mut catalog, &archive, &test_station(), &range(1, 10)).unwrap();
    assert_eq!(report.removed.len(), 1);
    assert_eq!(connector.snapshot().unwrap().rinex.len(), 1);
}

#[test]
fn test_unusable_archive_root_is_an_error() {
    let rows = vec![create_test_rinex(1, "a")];
    let connector = create_test_connector(rows, Vec::new());
    let mut catalog = connector.catalog();
    let archive = FsArchive::new("/nonexistent/archive/root");

    assert!(verify_archive_presence(&mut catalog, &archive, &test_station(), &range(1, 2)).is_err());
    assert_eq!(connector.snapshot().unwrap().rinex.len(), 1);
}
