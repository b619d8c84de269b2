//! Shared fixtures for spatial coherence tests

use crate::app::models::{Station, StationId};
use crate::constants::{WGS84_A, WGS84_E};

pub mod resolver_tests;

pub const BASE_LAT: f64 = -34.906_7;
pub const BASE_LON: f64 = -57.932_2;

/// Degrees of latitude spanning `metres` on the reference sphere
pub fn north(metres: f64) -> f64 {
    metres / 111_194.93
}

pub fn station_at(net: &str, stn: &str, lat: f64, lon: f64) -> Station {
    Station::new(StationId::new(net, stn))
        .with_position(lat, lon, 20.0)
        .unwrap()
}

pub fn declared() -> StationId {
    StationId::new("igs", "lpgs")
}

/// WGS84 geodetic (degrees, metres) to ECEF
pub fn lla_to_ecef(lat: f64, lon: f64, height: f64) -> [f64; 3] {
    let (phi, lambda) = (lat.to_radians(), lon.to_radians());
    let esq = WGS84_E * WGS84_E;
    let n = WGS84_A / (1.0 - esq * phi.sin().powi(2)).sqrt();
    [
        (n + height) * phi.cos() * lambda.cos(),
        (n + height) * phi.cos() * lambda.sin(),
        (n * (1.0 - esq) + height) * phi.sin(),
    ]
}
