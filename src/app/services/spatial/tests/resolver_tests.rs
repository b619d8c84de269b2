use super::*;
use crate::app::services::spatial::{SpatialMatch, SpatialResolver};

fn resolver(stations: Vec<Station>) -> SpatialResolver {
    SpatialResolver::new(&stations, 100.0)
}

#[test]
fn test_single_matching_candidate_is_confirmed() {
    let resolver = resolver(vec![
        station_at("igs", "lpgs", BASE_LAT, BASE_LON),
        station_at("igs", "far1", BASE_LAT + north(10_000.0), BASE_LON),
    ]);

    match resolver.resolve(BASE_LAT + north(3.0), BASE_LON, &declared()) {
        SpatialMatch::Confirmed(c) => {
            assert_eq!(c.station, declared());
            assert!((c.distance_m - 3.0).abs() < 0.01);
        }
        other => panic!("expected Confirmed, got {:?}", other),
    }
}

#[test]
fn test_single_foreign_candidate_is_name_mismatch() {
    let resolver = resolver(vec![station_at("rms", "lpg2", BASE_LAT, BASE_LON)]);

    match resolver.resolve(BASE_LAT, BASE_LON, &declared()) {
        SpatialMatch::NameMismatch { found } => {
            assert_eq!(found.station, StationId::new("rms", "lpg2"))
        }
        other => panic!("expected NameMismatch, got {:?}", other),
    }
}

#[test]
fn test_temporary_network_stations_are_not_candidates() {
    let resolver = resolver(vec![station_at("???", "xxxx", BASE_LAT, BASE_LON)]);

    match resolver.resolve(BASE_LAT, BASE_LON, &declared()) {
        SpatialMatch::NoMatch { closest: None } => {}
        other => panic!("expected NoMatch without a candidate, got {:?}", other),
    }
}

#[test]
fn test_no_match_reports_nearest_station() {
    let resolver = resolver(vec![
        station_at("igs", "lpgs", BASE_LAT + north(5_000.0), BASE_LON),
        station_at("igs", "near", BASE_LAT + north(500.0), BASE_LON),
    ]);

    let outcome = resolver.resolve(BASE_LAT, BASE_LON, &declared());
    match &outcome {
        SpatialMatch::NoMatch { closest: Some(c) } => {
            assert_eq!(c.station, StationId::new("igs", "near"));
            assert!((c.distance_m - 500.0).abs() < 0.1);
        }
        other => panic!("expected NoMatch, got {:?}", other),
    }
    assert!(outcome.describe(&declared(), "2021 001").contains("igs.near"));
}

#[test]
fn test_declared_nearest_among_several_is_confirmed() {
    let resolver = resolver(vec![
        station_at("igs", "lpgs", BASE_LAT + north(2.0), BASE_LON),
        station_at("rms", "lpg2", BASE_LAT + north(40.0), BASE_LON),
    ]);
    assert!(resolver.resolve(BASE_LAT, BASE_LON, &declared()).is_confirmed());
}

#[test]
fn test_tie_goes_to_declared_station() {
    let resolver = resolver(vec![
        station_at("rms", "lpg2", BASE_LAT, BASE_LON),
        station_at("igs", "lpgs", BASE_LAT, BASE_LON),
    ]);
    assert!(resolver.resolve(BASE_LAT, BASE_LON, &declared()).is_confirmed());
}

#[test]
fn test_closer_competitor_is_ambiguous() {
    let resolver = resolver(vec![
        station_at("igs", "lpgs", BASE_LAT + north(60.0), BASE_LON),
        station_at("rms", "lpg2", BASE_LAT + north(5.0), BASE_LON),
    ]);

    match resolver.resolve(BASE_LAT, BASE_LON, &declared()) {
        SpatialMatch::Ambiguous {
            candidates,
            declared: own,
            closest,
        } => {
            assert_eq!(candidates.len(), 2);
            assert_eq!(own.unwrap().station, declared());
            assert_eq!(closest.unwrap().station, StationId::new("rms", "lpg2"));
        }
        other => panic!("expected Ambiguous, got {:?}", other),
    }
}

#[test]
fn test_negligible_difference_has_no_closest() {
    let resolver = resolver(vec![
        station_at("igs", "lpgs", BASE_LAT + north(10.5), BASE_LON),
        station_at("rms", "lpg2", BASE_LAT + north(10.0), BASE_LON),
    ]);

    match resolver.resolve(BASE_LAT, BASE_LON, &declared()) {
        SpatialMatch::Ambiguous { closest, .. } => assert!(closest.is_none()),
        other => panic!("expected Ambiguous, got {:?}", other),
    }
}

#[test]
fn test_stations_without_coordinates_are_ignored() {
    let stations = vec![Station::new(declared())];
    let resolver = SpatialResolver::new(&stations, 100.0);
    assert_eq!(
        resolver.resolve(BASE_LAT, BASE_LON, &declared()),
        SpatialMatch::NoMatch { closest: None }
    );
}
