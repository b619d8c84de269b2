//! Coordinate conversions and surface distances

use crate::constants::{EARTH_RADIUS_M, WGS84_A, WGS84_E};

/// Geodetic position in degrees and metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub lat: f64,
    pub lon: f64,
    pub height: f64,
}

/// ECEF (metres) to WGS84 geodetic, Bowring's closed-form inversion
pub fn ecef_to_lla(x: f64, y: f64, z: f64) -> Geodetic {
    let a = WGS84_A;
    let esq = WGS84_E * WGS84_E;
    let b = (a * a * (1.0 - esq)).sqrt();
    let ep_sq = (a * a - b * b) / (b * b);

    let p = (x * x + y * y).sqrt();
    let theta = (a * z).atan2(b * p);
    let lon = y.atan2(x);
    let lat = (z + ep_sq * b * theta.sin().powi(3)).atan2(p - esq * a * theta.cos().powi(3));
    let n = a / (1.0 - esq * lat.sin().powi(2)).sqrt();
    let height = p / lat.cos() - n;

    Geodetic {
        lat: lat.to_degrees(),
        lon: lon.to_degrees(),
        height,
    }
}

/// Great-circle distance in metres between two points given in degrees
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecef_to_lla_reference_point() {
        let position = ecef_to_lla(2_297_292.91, 1_016_894.94, -5_843_939.62);
        assert!((position.lat - -66.876_540_017_4).abs() < 1e-6);
        assert!((position.lon - 23.876_539_914).abs() < 1e-6);
        assert!((position.height - 999.998).abs() < 1e-2);
    }

    #[test]
    fn test_haversine() {
        assert_eq!(haversine(10.0, 20.0, 10.0, 20.0), 0.0);

        // one degree of latitude on the reference sphere
        let degree = haversine(0.0, 0.0, 1.0, 0.0);
        assert!((degree - 111_194.9).abs() < 1.0);

        let symmetric = haversine(-34.9, -57.9, -34.91, -57.95);
        assert!((symmetric - haversine(-34.91, -57.95, -34.9, -57.9)).abs() < 1e-9);
    }
}
