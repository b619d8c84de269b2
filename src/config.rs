//! Configuration management and validation.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! environment variables, then command-line overrides (applied by the CLI).
//! [`Config::validate`] runs once every layer is in place.

use crate::app::services::station_info::Frame;
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_ARCHIVE_ROOT, DEFAULT_CATALOG_PATH,
    DEFAULT_PARALLEL_WORKERS, ENV_ARCHIVE_ROOT, ENV_CATALOG_PATH, ENV_WORKERS,
    MAX_PARALLEL_WORKERS, SPATIAL_TOLERANCE_M,
};
use crate::date::{GnssDate, parse_date_token};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub spatial: SpatialConfig,
    /// Reference frames with their ANTEX files, for the calibration check
    #[serde(default)]
    pub frames: Vec<FrameConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Root directory of the RINEX archive
    #[serde(default = "default_archive_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON snapshot the catalog is loaded from and saved back to
    #[serde(default = "default_catalog_path")]
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_parallel_workers")]
    pub parallel_workers: usize,

    /// Run per-station checks one after the other
    #[serde(default)]
    pub serial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance_m: f64,
}

/// A reference frame as written in the config file
///
/// `start` and `end` accept the date-filter forms (`yyyy_ddd`, `yyyy/mm/dd`,
/// fractional year, `wwww-d`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub name: String,
    pub start: String,
    pub end: String,
    pub atx: PathBuf,
}

fn default_archive_root() -> PathBuf {
    PathBuf::from(DEFAULT_ARCHIVE_ROOT)
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from(DEFAULT_CATALOG_PATH)
}

fn default_parallel_workers() -> usize {
    num_cpus::get().clamp(1, DEFAULT_PARALLEL_WORKERS)
}

fn default_tolerance() -> f64 {
    SPATIAL_TOLERANCE_M
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: default_archive_root(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_catalog_path(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            parallel_workers: default_parallel_workers(),
            serial: false,
        }
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            tolerance_m: default_tolerance(),
        }
    }
}

impl FrameConfig {
    fn to_frame(&self) -> Result<Frame> {
        let today = GnssDate::today();
        let start = parse_date_token(&self.start, 1, today)?;
        let end = parse_date_token(&self.end, 1, today)?;
        if end < start {
            return Err(Error::configuration(format!(
                "Frame {} ends before it starts",
                self.name
            )));
        }
        Ok(Frame {
            name: self.name.clone(),
            start,
            end,
            atx: self.atx.clone(),
        })
    }
}

impl Config {
    /// `<config dir>/gnss-integrity/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Could not determine the user config directory"))
    }

    /// Parse a TOML config file; missing sections fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        let config: Config = toml::from_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults, then the file (if any), then the environment
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply the `GNSS_INTEGRITY_*` variables found by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_ARCHIVE_ROOT) {
            self.archive.root = PathBuf::from(root);
        }
        if let Some(path) = lookup(ENV_CATALOG_PATH) {
            self.catalog.snapshot_path = PathBuf::from(path);
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            self.performance.parallel_workers = workers.trim().parse().map_err(|_| {
                Error::configuration(format!("{} must be a number, got '{}'", ENV_WORKERS, workers))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.performance.parallel_workers == 0
            || self.performance.parallel_workers > MAX_PARALLEL_WORKERS
        {
            return Err(Error::configuration(format!(
                "parallel_workers must be between 1 and {}, got {}",
                MAX_PARALLEL_WORKERS, self.performance.parallel_workers
            )));
        }
        if !(self.spatial.tolerance_m.is_finite() && self.spatial.tolerance_m > 0.0) {
            return Err(Error::configuration(format!(
                "spatial tolerance must be a positive distance, got {}",
                self.spatial.tolerance_m
            )));
        }
        if self.catalog.snapshot_path.as_os_str().is_empty() {
            return Err(Error::configuration("catalog snapshot path is empty"));
        }
        self.frames()?;
        Ok(())
    }

    /// Configured frames, ordered by start date
    pub fn frames(&self) -> Result<Vec<Frame>> {
        let mut frames = self
            .frames
            .iter()
            .map(FrameConfig::to_frame)
            .collect::<Result<Vec<_>>>()?;
        frames.sort_by_key(|f| f.start);
        Ok(frames)
    }

    /// Worker count honouring the serial switch
    pub fn effective_workers(&self) -> usize {
        if self.performance.serial {
            1
        } else {
            self.performance.parallel_workers
        }
    }
}
