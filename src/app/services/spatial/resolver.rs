//! Nearest-station resolution of a computed position

use crate::app::models::{Station, StationId};
use crate::app::services::spatial::geodesy::haversine;
use crate::constants::NEGLIGIBLE_DISTANCE_M;
use std::cmp::Ordering;
use std::fmt;

/// A station and its distance to the queried position
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub station: StationId,
    pub distance_m: f64,
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.3} m", self.station, self.distance_m)
    }
}

/// Classification of a position against the declared station
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialMatch {
    Confirmed(Candidate),
    /// The only station within tolerance is not the declared one
    NameMismatch { found: Candidate },
    /// Several stations within tolerance and the declared one is not a clear winner
    Ambiguous {
        candidates: Vec<Candidate>,
        declared: Option<Candidate>,
        /// Closest station, when it beats the declared one by more than a negligible distance
        closest: Option<Candidate>,
    },
    /// Nothing within tolerance; `closest` is the nearest station at any distance
    NoMatch { closest: Option<Candidate> },
}

impl SpatialMatch {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SpatialMatch::Confirmed(_))
    }

    /// Diagnostic line for a solution declared as `declared` on `label`
    pub fn describe(&self, declared: &StationId, label: &str) -> String {
        match self {
            SpatialMatch::Confirmed(c) => {
                format!("Solution for {} {} confirmed ({:.3} m)", declared, label, c.distance_m)
            }
            SpatialMatch::NameMismatch { found } => format!(
                "Warning! Solution for {} {} is a match for {} (only this candidate was found)",
                declared, label, found.station
            ),
            SpatialMatch::Ambiguous {
                declared: Some(own),
                closest: Some(closest),
                ..
            } => format!(
                "Warning! Solution for {} {} was found to be closer to {}. Distance to {}. \
                 Distance to {}",
                declared, label, closest.station, closest, own
            ),
            SpatialMatch::Ambiguous { candidates, .. } => {
                let listed: Vec<String> = candidates.iter().map(|c| c.to_string()).collect();
                format!(
                    "Warning! Solution for {} {} does not match its station code. Candidates and \
                     distances found: {}",
                    declared,
                    label,
                    listed.join(", ")
                )
            }
            SpatialMatch::NoMatch { closest: Some(c) } => format!(
                "Warning! PPP for {} {} had no match within tolerance. Closest station is {} ({:.3} km, \
                 {:.6} {:.6})",
                declared,
                label,
                c.station,
                c.distance_m / 1000.0,
                c.lat,
                c.lon
            ),
            SpatialMatch::NoMatch { closest: None } => format!(
                "Warning! PPP for {} {} had no match and no station has coordinates",
                declared, label
            ),
        }
    }
}

/// Resolves positions against the stations with known coordinates
#[derive(Debug, Clone)]
pub struct SpatialResolver {
    stations: Vec<(StationId, f64, f64)>,
    tolerance_m: f64,
}

impl SpatialResolver {
    /// Stations without coordinates are ignored
    pub fn new(stations: &[Station], tolerance_m: f64) -> Self {
        let stations = stations
            .iter()
            .filter(|s| !s.id.is_temporary())
            .filter_map(|s| s.position().map(|(lat, lon)| (s.id.clone(), lat, lon)))
            .collect();
        Self {
            stations,
            tolerance_m,
        }
    }

    pub fn tolerance_m(&self) -> f64 {
        self.tolerance_m
    }

    /// Every station sorted by distance; on equal distance `declared` comes first
    fn ranked(&self, lat: f64, lon: f64, declared: &StationId) -> Vec<Candidate> {
        let mut ranked: Vec<Candidate> = self
            .stations
            .iter()
            .map(|(id, s_lat, s_lon)| Candidate {
                station: id.clone(),
                distance_m: haversine(lat, lon, *s_lat, *s_lon),
                lat: *s_lat,
                lon: *s_lon,
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.distance_m
                .partial_cmp(&b.distance_m)
                .unwrap_or(Ordering::Equal)
                .then_with(|| (b.station == *declared).cmp(&(a.station == *declared)))
        });
        ranked
    }

    /// Stations within the tolerance radius, nearest first
    pub fn within_tolerance(&self, lat: f64, lon: f64, declared: &StationId) -> Vec<Candidate> {
        self.ranked(lat, lon, declared)
            .into_iter()
            .take_while(|c| c.distance_m <= self.tolerance_m)
            .collect()
    }

    /// Nearest station regardless of distance
    pub fn closest(&self, lat: f64, lon: f64, declared: &StationId) -> Option<Candidate> {
        self.ranked(lat, lon, declared).into_iter().next()
    }

    pub fn resolve(&self, lat: f64, lon: f64, declared: &StationId) -> SpatialMatch {
        let mut candidates = self.within_tolerance(lat, lon, declared);

        match candidates.len() {
            0 => SpatialMatch::NoMatch {
                closest: self.closest(lat, lon, declared),
            },
            1 => {
                let found = candidates.remove(0);
                if found.station == *declared {
                    SpatialMatch::Confirmed(found)
                } else {
                    SpatialMatch::NameMismatch { found }
                }
            }
            _ => {
                let own = candidates.iter().find(|c| c.station == *declared).cloned();
                let nearest = candidates[0].clone();

                // ties already rank the declared station first
                if let Some(own) = own.as_ref().filter(|o| o.station == nearest.station) {
                    return SpatialMatch::Confirmed(own.clone());
                }

                let closest = match &own {
                    Some(own) if own.distance_m - nearest.distance_m <= NEGLIGIBLE_DISTANCE_M => None,
                    _ => Some(nearest),
                };
                SpatialMatch::Ambiguous {
                    candidates,
                    declared: own,
                    closest,
                }
            }
        }
    }
}
