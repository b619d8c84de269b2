use super::*;
use crate::app::services::rinex_reconciler::{
    coalesce_gaps, count_daily_rinex, find_gaps, missing_days, render_gap_chart,
};
use std::collections::BTreeSet;

fn observed(doys: &[u32]) -> BTreeSet<i64> {
    doys.iter().map(|d| day(*d).mjd()).collect()
}

#[test]
fn test_missing_days_is_exact_complement() {
    let missing = missing_days(&observed(&[1, 2, 5, 6]), &range(1, 6));
    let doys: Vec<u32> = missing.iter().map(|d| d.doy()).collect();
    assert_eq!(doys, vec![3, 4]);
}

#[test]
fn test_coalesce_gaps_threshold() {
    let short: Vec<GnssDate> = (10..13).map(day).collect();
    assert!(coalesce_gaps(&short, 5).is_empty());

    let long: Vec<GnssDate> = (20..26).map(day).collect();
    let gaps = coalesce_gaps(&long, 5);
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].days(), 6);

    let both: Vec<GnssDate> = short.into_iter().chain(long).collect();
    let gaps = coalesce_gaps(&both, 0);
    assert_eq!(gaps.len(), 2);
    assert_eq!(gaps[0].to_string(), "2021 010 -> 2021 012 (3 days)");
}

#[test]
fn test_find_gaps_clips_to_observed_span() {
    let rinex = [3, 4, 7, 10].iter().map(|d| create_test_rinex(*d, "s")).collect();
    let connector = create_test_connector(rinex, Vec::new());
    let catalog = connector.catalog();

    let scan = find_gaps(&catalog, &test_station(), &range(1, 20)).unwrap();
    let span = scan.span.unwrap();
    assert_eq!((span.start, span.end), (day(3), day(10)));
    let doys: Vec<u32> = scan.missing.iter().map(|d| d.doy()).collect();
    assert_eq!(doys, vec![5, 6, 8, 9]);
}

#[test]
fn test_find_gaps_without_data() {
    let connector = create_test_connector(Vec::new(), Vec::new());
    let catalog = connector.catalog();

    let scan = find_gaps(&catalog, &test_station(), &range(1, 20)).unwrap();
    assert!(scan.span.is_none());
    assert!(scan.missing.is_empty());
}

#[test]
fn test_gap_chart_glyphs() {
    let chart = render_gap_chart(&test_station(), &observed(&[1, 2, 3, 6, 7]), &range(1, 7));
    let lines: Vec<&str> = chart.lines().collect();
    assert_eq!(
        lines[0],
        " -- rms.lpgs: (First and last observation in timespan: 2021 001 - 2021 007)"
    );
    assert_eq!(lines[2], "2021:");
    // days 1-2 both, 3-4 first only, 5-6 second only, 7 alone
    assert_eq!(lines[3], "    001>█▌▐▌<007");
}

#[test]
fn test_gap_chart_wraps_long_years() {
    let all: Vec<u32> = (1..=365).collect();
    let chart = render_gap_chart(&test_station(), &observed(&all), &range(1, 365));
    let rows: Vec<&str> = chart.lines().filter(|l| l.starts_with("    ")).collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[0].starts_with("    001>"));
    assert!(rows[3].ends_with("<365"));
}

#[test]
fn test_daily_counts_use_processed_view() {
    let mut duplicate = create_test_rinex(2, "1700001");
    duplicate.filename = "lpgs0021.21o".to_string();
    duplicate.completion = 0.4;
    let connector = create_test_connector(
        vec![
            create_test_rinex(1, "1700001"),
            create_test_rinex(2, "1700001"),
            duplicate,
            create_test_rinex(9, "1700001"),
        ],
        vec![],
    );

    let counts =
        count_daily_rinex(&connector.catalog(), &[test_station()], &range(1, 5)).unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts.get(&(2021, 2)), Some(&1));
    assert!(!counts.contains_key(&(2021, 9)));
}
