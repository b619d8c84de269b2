use super::*;
use crate::app::services::rinex_reconciler::{
    SerialMismatch, coalesce_mismatches, verify_receiver_serial,
};

fn mismatch(doy: u32, observed: &str, declared: &str) -> SerialMismatch {
    SerialMismatch {
        date: day(doy),
        observed: observed.to_string(),
        declared: declared.to_string(),
    }
}

#[test]
fn test_three_consecutive_days_form_one_run() {
    let runs = coalesce_mismatches(vec![
        mismatch(12, "a", "b"),
        mismatch(10, "a", "b"),
        mismatch(11, "a", "b"),
    ]);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].start, day(10));
    assert_eq!(runs[0].end, day(12));
    assert_eq!(runs[0].days, 3);
}

#[test]
fn test_runs_split_on_pair_change_and_holes() {
    let runs = coalesce_mismatches(vec![
        mismatch(1, "a", "b"),
        mismatch(2, "a", "b"),
        mismatch(3, "c", "b"),
        mismatch(5, "c", "b"),
    ]);
    let spans: Vec<(u32, u32)> = runs.iter().map(|r| (r.start.doy(), r.end.doy())).collect();
    assert_eq!(spans, vec![(1, 2), (3, 3), (5, 5)]);
}

#[test]
fn test_serials_compared_case_insensitively() {
    let rinex = vec![
        create_test_rinex(1, "ABC123"),
        create_test_rinex(2, "abc123"),
        create_test_rinex(3, "XYZ999"),
        create_test_rinex(4, "XYZ999"),
    ];
    let records = vec![create_test_record(1, None, "abc123")];
    let connector = create_test_connector(rinex, records);
    let catalog = connector.catalog();

    let report = verify_receiver_serial(&catalog, &test_station(), &range(1, 10)).unwrap();
    assert_eq!(report.checked, 4);
    assert_eq!(report.runs.len(), 1);

    let run = &report.runs[0];
    assert_eq!((run.start, run.end), (day(3), day(4)));
    assert_eq!(run.observed, "xyz999");
    assert_eq!(run.declared, "abc123");
    assert!(run.to_string().contains("RINEX SN xyz999 != Station Information abc123"));
}

#[test]
fn test_resolution_uses_session_midpoint() {
    // the file of day 10 starts before the second record but its midpoint falls after
    let mut late = create_test_rinex(10, "new");
    late.observation_stime = day(9).at_time(20, 0, 0).unwrap();
    late.observation_etime = day(10).at_time(23, 0, 0).unwrap();
    let records = vec![
        create_test_record(1, Some(10), "old"),
        create_test_record(10, None, "new"),
    ];
    let connector = create_test_connector(vec![late], records);
    let catalog = connector.catalog();

    let report = verify_receiver_serial(&catalog, &test_station(), &range(1, 20)).unwrap();
    assert!(report.runs.is_empty());
}

#[test]
fn test_uncovered_rows_are_listed_separately() {
    let rinex = vec![create_test_rinex(1, "abc"), create_test_rinex(30, "abc")];
    let records = vec![create_test_record(10, Some(20), "abc")];
    let connector = create_test_connector(rinex, records);
    let catalog = connector.catalog();

    let report = verify_receiver_serial(&catalog, &test_station(), &range(1, 40)).unwrap();
    assert!(report.runs.is_empty());
    assert_eq!(report.unresolved.len(), 2);
}
