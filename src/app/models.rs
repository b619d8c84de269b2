//! Core data models for the archive catalog
//!
//! This module defines the station identity, station-info records, RINEX
//! inventory rows and PPP solutions exchanged between the catalog adapters
//! and the integrity services. Records are fixed-shape structs validated at
//! construction time.

use crate::constants::{HEIGHT_CODES, NO_RADOME, TEMPORARY_NETWORK_PREFIX};
use crate::date::GnssDate;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod event;

pub use event::{Event, EventType};

// =============================================================================
// Station Identity
// =============================================================================

/// Network and station code pair, written `net.stn`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationId {
    pub network_code: String,
    pub station_code: String,
}

impl StationId {
    /// Create an identity; codes are stored lowercase
    pub fn new(network_code: impl Into<String>, station_code: impl Into<String>) -> Self {
        Self {
            network_code: network_code.into().trim().to_lowercase(),
            station_code: station_code.into().trim().to_lowercase(),
        }
    }

    /// Networks starting with `?` hold stations that were never identified
    pub fn is_temporary(&self) -> bool {
        self.network_code.starts_with(TEMPORARY_NETWORK_PREFIX)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.network_code, self.station_code)
    }
}

impl FromStr for StationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('.') {
            Some((net, stn)) if !net.is_empty() && !stn.is_empty() && !stn.contains('.') => {
                Ok(StationId::new(net, stn))
            }
            _ => Err(Error::validation(format!(
                "Invalid station identity '{}': expected net.stn",
                s
            ))),
        }
    }
}

/// A station row with its declared geodetic position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub height: Option<f64>,
}

impl Station {
    pub fn new(id: StationId) -> Self {
        Self {
            id,
            lat: None,
            lon: None,
            height: None,
        }
    }

    /// Attach a geodetic position in degrees and meters
    pub fn with_position(mut self, lat: f64, lon: f64, height: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Error::validation(format!(
                "Invalid latitude {}: must be between -90 and 90 degrees",
                lat
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(Error::validation(format!(
                "Invalid longitude {}: must be between -180 and 180 degrees",
                lon
            )));
        }
        self.lat = Some(lat);
        self.lon = Some(lon);
        self.height = Some(height);
        Ok(self)
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

// =============================================================================
// Station Info
// =============================================================================

/// Reference point the antenna height is measured to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeightCode {
    Dhtgp,
    Dhpab,
    Slbdn,
    Slbcr,
    Sltep,
    Dhbcr,
    Slhgp,
    Sltgn,
    #[default]
    Dharp,
    Slbce,
}

impl HeightCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeightCode::Dhtgp => "DHTGP",
            HeightCode::Dhpab => "DHPAB",
            HeightCode::Slbdn => "SLBDN",
            HeightCode::Slbcr => "SLBCR",
            HeightCode::Sltep => "SLTEP",
            HeightCode::Dhbcr => "DHBCR",
            HeightCode::Slhgp => "SLHGP",
            HeightCode::Sltgn => "SLTGN",
            HeightCode::Dharp => "DHARP",
            HeightCode::Slbce => "SLBCE",
        }
    }
}

impl fmt::Display for HeightCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeightCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "DHTGP" => Ok(HeightCode::Dhtgp),
            "DHPAB" => Ok(HeightCode::Dhpab),
            "SLBDN" => Ok(HeightCode::Slbdn),
            "SLBCR" => Ok(HeightCode::Slbcr),
            "SLTEP" => Ok(HeightCode::Sltep),
            "DHBCR" => Ok(HeightCode::Dhbcr),
            "SLHGP" => Ok(HeightCode::Slhgp),
            "SLTGN" => Ok(HeightCode::Sltgn),
            "DHARP" => Ok(HeightCode::Dharp),
            "SLBCE" => Ok(HeightCode::Slbce),
            _ => Err(Error::validation(format!(
                "Invalid height code '{}'. Allowed codes: {}",
                s.trim(),
                HEIGHT_CODES.join(", ")
            ))),
        }
    }
}

/// One dated receiver/antenna configuration of a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationInfoRecord {
    pub station: StationId,
    pub date_start: GnssDate,
    /// `None` marks the open, currently active record
    pub date_end: Option<GnssDate>,
    pub receiver_code: String,
    pub receiver_serial: String,
    pub receiver_firmware: String,
    pub receiver_vers: String,
    pub antenna_code: String,
    pub radome_code: String,
    pub antenna_serial: String,
    pub antenna_height: f64,
    pub antenna_north: f64,
    pub antenna_east: f64,
    pub height_code: HeightCode,
    pub comments: String,
}

impl StationInfoRecord {
    /// Create an open record with zero offsets and the default height code
    pub fn new(
        station: StationId,
        date_start: GnssDate,
        receiver_code: impl Into<String>,
        antenna_code: impl Into<String>,
    ) -> Self {
        Self {
            station,
            date_start,
            date_end: None,
            receiver_code: receiver_code.into(),
            receiver_serial: String::new(),
            receiver_firmware: String::new(),
            receiver_vers: String::new(),
            antenna_code: antenna_code.into(),
            radome_code: NO_RADOME.to_string(),
            antenna_serial: String::new(),
            antenna_height: 0.0,
            antenna_north: 0.0,
            antenna_east: 0.0,
            height_code: HeightCode::default(),
            comments: String::new(),
        }
    }

    pub fn with_date_end(mut self, date_end: Option<GnssDate>) -> Self {
        self.date_end = date_end;
        self
    }

    pub fn with_receiver_serial(mut self, serial: impl Into<String>) -> Self {
        self.receiver_serial = serial.into();
        self
    }

    pub fn with_receiver_firmware(mut self, firmware: impl Into<String>) -> Self {
        self.receiver_firmware = firmware.into();
        self
    }

    pub fn with_antenna_serial(mut self, serial: impl Into<String>) -> Self {
        self.antenna_serial = serial.into();
        self
    }

    pub fn with_radome(mut self, radome: impl Into<String>) -> Self {
        self.radome_code = radome.into();
        self
    }

    /// Set the antenna offsets (height, north, east) and their reference
    pub fn with_offsets(mut self, height: f64, north: f64, east: f64, code: HeightCode) -> Self {
        self.antenna_height = height;
        self.antenna_north = north;
        self.antenna_east = east;
        self.height_code = code;
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    pub fn is_open(&self) -> bool {
        self.date_end.is_none()
    }

    /// Inclusive containment, used when resolving the record for a date
    pub fn covers(&self, date: &GnssDate) -> bool {
        self.date_start <= *date && self.date_end.is_none_or(|end| *date <= end)
    }

    /// Same record under another station identity
    pub fn retagged(&self, station: &StationId) -> Self {
        Self {
            station: station.clone(),
            ..self.clone()
        }
    }

    /// Check field-level consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(end) = &self.date_end {
            if *end <= self.date_start {
                return Err(Error::validation(format!(
                    "Station info for {}: DateEnd {} must be after DateStart {}",
                    self.station,
                    end.stninfo_string(),
                    self.date_start.stninfo_string()
                )));
            }
        }

        for (name, value) in [
            ("AntennaHeight", self.antenna_height),
            ("AntennaNorth", self.antenna_north),
            ("AntennaEast", self.antenna_east),
        ] {
            if !value.is_finite() {
                return Err(Error::validation(format!(
                    "Station info for {}: {} must be a number",
                    self.station, name
                )));
            }
        }

        if self.receiver_code.trim().is_empty() {
            return Err(Error::validation(format!(
                "Station info for {}: ReceiverCode cannot be empty",
                self.station
            )));
        }
        if self.antenna_code.trim().is_empty() {
            return Err(Error::validation(format!(
                "Station info for {}: AntennaCode cannot be empty",
                self.station
            )));
        }

        Ok(())
    }
}

/// Parse a numeric offset typed by a user
pub fn parse_offset(field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::validation(format!("{} must be numeric, got '{}'", field, value)))
}

// =============================================================================
// RINEX Inventory
// =============================================================================

/// Catalog entry for one RINEX observation file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RinexFile {
    pub station: StationId,
    pub observation_year: i32,
    pub observation_doy: u32,
    pub observation_stime: GnssDate,
    pub observation_etime: GnssDate,
    pub observation_fyear: f64,
    pub receiver_type: String,
    pub receiver_serial: String,
    pub receiver_firmware: String,
    pub antenna_type: String,
    pub antenna_serial: String,
    pub antenna_dome: String,
    pub antenna_offset: f64,
    pub interval: f64,
    pub filename: String,
    /// Fraction of the day actually observed (0..=1)
    pub completion: f64,
}

impl RinexFile {
    /// Create an inventory row; year, doy and fyear come from the session start
    pub fn new(
        station: StationId,
        stime: GnssDate,
        etime: GnssDate,
        filename: impl Into<String>,
    ) -> Result<Self> {
        if etime < stime {
            return Err(Error::validation(format!(
                "RINEX session for {} ends before it starts",
                station
            )));
        }
        Ok(Self {
            observation_year: stime.year(),
            observation_doy: stime.doy(),
            observation_fyear: GnssDate::midpoint(&stime, &etime).fyear(),
            station,
            observation_stime: stime,
            observation_etime: etime,
            receiver_type: String::new(),
            receiver_serial: String::new(),
            receiver_firmware: String::new(),
            antenna_type: String::new(),
            antenna_serial: String::new(),
            antenna_dome: NO_RADOME.to_string(),
            antenna_offset: 0.0,
            interval: 30.0,
            filename: filename.into(),
            completion: 1.0,
        })
    }

    pub fn with_receiver(
        mut self,
        receiver_type: impl Into<String>,
        serial: impl Into<String>,
        firmware: impl Into<String>,
    ) -> Self {
        self.receiver_type = receiver_type.into();
        self.receiver_serial = serial.into();
        self.receiver_firmware = firmware.into();
        self
    }

    pub fn with_antenna(
        mut self,
        antenna_type: impl Into<String>,
        serial: impl Into<String>,
        dome: impl Into<String>,
        offset: f64,
    ) -> Self {
        self.antenna_type = antenna_type.into();
        self.antenna_serial = serial.into();
        self.antenna_dome = dome.into();
        self.antenna_offset = offset;
        self
    }

    pub fn with_completion(mut self, completion: f64) -> Self {
        self.completion = completion;
        self
    }

    /// Observation day at 00:00:00
    pub fn date(&self) -> GnssDate {
        self.observation_stime.start_of_day()
    }

    /// Midpoint of the observed session
    pub fn session_midpoint(&self) -> GnssDate {
        GnssDate::midpoint(&self.observation_stime, &self.observation_etime)
    }

    /// Receiver/antenna metadata reported in the file header
    pub fn equipment(&self) -> Equipment {
        Equipment {
            receiver_type: self.receiver_type.clone(),
            receiver_serial: self.receiver_serial.clone(),
            receiver_firmware: self.receiver_firmware.clone(),
            antenna_type: self.antenna_type.clone(),
            antenna_serial: self.antenna_serial.clone(),
            antenna_dome: self.antenna_dome.clone(),
            antenna_offset_um: (self.antenna_offset * 1_000_000.0).round() as i64,
        }
    }
}

/// Equipment as reported by RINEX headers; equal values mean "same setup"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Equipment {
    pub receiver_type: String,
    pub receiver_serial: String,
    pub receiver_firmware: String,
    pub antenna_type: String,
    pub antenna_serial: String,
    pub antenna_dome: String,
    pub antenna_offset_um: i64,
}

// =============================================================================
// PPP Solutions
// =============================================================================

/// ECEF position computed by PPP for one station-day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PppSolution {
    pub station: StationId,
    pub year: i32,
    pub doy: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub reference_frame: String,
}

impl PppSolution {
    pub fn new(station: StationId, year: i32, doy: u32, xyz: [f64; 3]) -> Self {
        Self {
            station,
            year,
            doy,
            x: xyz[0],
            y: xyz[1],
            z: xyz[2],
            reference_frame: String::new(),
        }
    }

    pub fn date(&self) -> Result<GnssDate> {
        GnssDate::from_year_doy(self.year, self.doy)
    }

    /// Key shared with the exclusion table
    pub fn key(&self) -> SolutionKey {
        SolutionKey {
            station: self.station.clone(),
            year: self.year,
            doy: self.doy,
        }
    }
}

/// Identifies a PPP solution (station-day)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SolutionKey {
    pub station: StationId,
    pub year: i32,
    pub doy: u32,
}
