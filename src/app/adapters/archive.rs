//! Physical archive of RINEX files
//!
//! Files live under `<root>/<net>/<stn>/<yyyy>/<ddd>/` in their compressed
//! form: an observation file `braz0450.20o` is stored as `braz0450.20d.Z`.

use crate::app::models::{RinexFile, StationId};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Archive operations the integrity checks depend on
///
/// Paths passed to and returned by the trait are relative to the archive root.
pub trait Archive: Send + Sync {
    /// Canonical relative path of an inventory row
    fn rinex_path(&self, file: &RinexFile) -> PathBuf {
        canonical_path(&file.station, file.observation_year, file.observation_doy, &file.filename)
    }

    fn exists(&self, relative: &Path) -> Result<bool>;

    /// Move a file, creating the destination directories
    fn move_file(&self, from: &Path, to: &Path) -> Result<()>;
}

/// Name under which an observation file is stored (`.yyo` becomes `.yyd.Z`)
pub fn archived_filename(filename: &str) -> String {
    let bytes = filename.as_bytes();
    let len = bytes.len();
    let is_observation = len > 4
        && bytes[len - 4] == b'.'
        && bytes[len - 3].is_ascii_digit()
        && bytes[len - 2].is_ascii_digit()
        && matches!(bytes[len - 1], b'o' | b'O');
    if is_observation {
        format!("{}d.Z", &filename[..len - 1])
    } else {
        filename.to_string()
    }
}

/// `<net>/<stn>/<yyyy>/<ddd>/<archived filename>`
pub fn canonical_path(station: &StationId, year: i32, doy: u32, filename: &str) -> PathBuf {
    PathBuf::from(&station.network_code)
        .join(&station.station_code)
        .join(format!("{}", year))
        .join(format!("{:03}", doy))
        .join(archived_filename(filename))
}

/// Archive stored on the local filesystem
#[derive(Debug, Clone)]
pub struct FsArchive {
    root: PathBuf,
}

impl FsArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn absolute(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

impl Archive for FsArchive {
    fn exists(&self, relative: &Path) -> Result<bool> {
        if !self.root.is_dir() {
            return Err(Error::configuration(format!(
                "Archive root {} is not a directory",
                self.root.display()
            )));
        }
        Ok(self.absolute(relative).is_file())
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        let source = self.absolute(from);
        let target = self.absolute(to);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::io(format!("Failed to create directory {}", parent.display()), e)
            })?;
        }

        if let Err(rename_error) = fs::rename(&source, &target) {
            // rename fails across filesystems; fall back to copy + delete
            fs::copy(&source, &target).map_err(|_| {
                Error::io(
                    format!("Failed to move {} to {}", source.display(), target.display()),
                    rename_error,
                )
            })?;
            fs::remove_file(&source).map_err(|e| {
                Error::io(format!("Failed to remove {}", source.display()), e)
            })?;
        }

        debug!("Moved {} -> {}", source.display(), target.display());
        Ok(())
    }
}
