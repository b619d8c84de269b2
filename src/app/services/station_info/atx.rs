//! Antenna calibration lookups against ANTEX files
//!
//! Each reference frame names the ANTEX file holding the antenna/radome
//! calibrations valid for it. A station-info record whose antenna and radome
//! pair is missing from the file of the frame in force at its DateStart cannot
//! be processed and is reported.

use crate::app::models::StationInfoRecord;
use crate::date::GnssDate;
use crate::{Error, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A reference frame and the period it is used for
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub name: String,
    pub start: GnssDate,
    pub end: GnssDate,
    pub atx: PathBuf,
}

/// Frame whose period contains `date`
pub fn determine_frame<'a>(frames: &'a [Frame], date: &GnssDate) -> Result<&'a Frame> {
    frames
        .iter()
        .find(|f| f.start <= *date && *date <= f.end)
        .ok_or_else(|| Error::not_found(format!("No reference frame covers {}", date)))
}

/// Antenna/radome pairs calibrated in one ANTEX file
#[derive(Debug, Clone, Default)]
pub struct AntennaCalibrations {
    pairs: HashSet<(String, String)>,
}

impl AntennaCalibrations {
    pub fn parse(content: &str) -> Result<Self> {
        let pattern = Regex::new(r"START OF ANTENNA\s+(\w+[.\-/+]?\w*[.\-/+]?\w*)\s+(\w+)")?;
        let pairs = pattern
            .captures_iter(content)
            .map(|c| (c[1].to_string(), c[2].to_string()))
            .collect();
        Ok(Self { pairs })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read ANTEX file {}", path.display()), e))?;
        let calibrations = Self::parse(&content)?;
        debug!("{} antenna calibrations in {}", calibrations.len(), path.display());
        Ok(calibrations)
    }

    pub fn contains(&self, antenna: &str, radome: &str) -> bool {
        self.pairs
            .contains(&(antenna.trim().to_string(), radome.trim().to_string()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Checks records against the ANTEX file of their frame, caching each file
#[derive(Debug, Default)]
pub struct CalibrationChecker {
    frames: Vec<Frame>,
    loaded: HashMap<PathBuf, AntennaCalibrations>,
}

impl CalibrationChecker {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            loaded: HashMap::new(),
        }
    }

    /// Preloaded calibrations for a frame's ANTEX path
    pub fn with_calibrations(mut self, atx: PathBuf, calibrations: AntennaCalibrations) -> Self {
        self.loaded.insert(atx, calibrations);
        self
    }

    pub fn has_frames(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Human-readable problem for `record`, or `None` when it is calibrated
    pub fn check(&mut self, record: &StationInfoRecord) -> Result<Option<String>> {
        let frame = determine_frame(&self.frames, &record.date_start)?.clone();
        if !self.loaded.contains_key(&frame.atx) {
            let calibrations = AntennaCalibrations::load(&frame.atx)?;
            self.loaded.insert(frame.atx.clone(), calibrations);
        }

        let calibrated = self
            .loaded
            .get(&frame.atx)
            .is_some_and(|c| c.contains(&record.antenna_code, &record.radome_code));
        if calibrated {
            return Ok(None);
        }

        Ok(Some(format!(
            "{} {} (record starting {}) is not calibrated in {} ({})",
            record.antenna_code,
            record.radome_code,
            record.date_start.stninfo_string(),
            frame.name,
            frame.atx.display()
        )))
    }
}
