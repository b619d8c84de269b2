//! Station merge/rename
//!
//! Moves the inventory rows and archive files of a station inside a date range
//! to another station, then makes sure the destination has station info for
//! the moved days. Files are migrated strictly one after the other, each in
//! its own transaction: rename the row, move the file, commit. A failure rolls
//! back the file in flight and stops the merge; files migrated before it stay
//! migrated.

use crate::app::adapters::archive::{Archive, canonical_path};
use crate::app::adapters::catalog::{Catalog, RinexTable};
use crate::app::models::{RinexFile, StationId};
use crate::app::services::station_info::StationInfoStore;
use crate::date::{DateRange, GnssDate};
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One file moved to the destination station
#[derive(Debug, Clone, PartialEq)]
pub struct MovedFile {
    pub date: GnssDate,
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub moved: Vec<MovedFile>,
    /// DateStart of the station-info records copied to the destination
    pub stninfo_copied: Vec<GnssDate>,
    pub warnings: Vec<String>,
}

/// Filename with its leading station code swapped for `dest`'s
pub fn renamed_filename(filename: &str, source: &StationId, dest: &StationId) -> String {
    let code = &source.station_code;
    match filename.get(..code.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(code) => {
            let replacement = if prefix.chars().all(|c| !c.is_ascii_lowercase()) {
                dest.station_code.to_uppercase()
            } else {
                dest.station_code.clone()
            };
            format!("{}{}", replacement, &filename[code.len()..])
        }
        _ => filename.to_string(),
    }
}

/// Reassign every inventory row of `source` in `range` to `dest`
///
/// # Returns
/// * `Err(Error::NotFound)` - the destination station does not exist
/// * `Err(Error::TransactionFailure)` - a file could not be migrated; it was
///   rolled back and the remaining files were not attempted
pub fn merge_station(
    catalog: &mut dyn Catalog,
    archive: &dyn Archive,
    source: &StationId,
    dest: &StationId,
    range: &DateRange,
) -> Result<MergeReport> {
    if source == dest {
        return Err(Error::validation(format!(
            "Cannot merge {} into itself",
            source
        )));
    }
    if catalog.station(dest)?.is_none() {
        return Err(Error::not_found(format!("Destination station {}", dest)));
    }

    let rows = catalog.rinex_in_range(source, range, RinexTable::Archive)?;
    info!("Merging {} files of {} into {} ({})", rows.len(), source, dest, range);

    let mut report = MergeReport::default();
    for row in &rows {
        let moved = migrate_file(catalog, archive, row, source, dest)
            .map_err(|e| Error::transaction_failure(&row.filename, e))?;
        report.moved.push(moved);
    }

    let observed: BTreeSet<GnssDate> = rows.iter().map(|r| r.observation_stime).collect();
    for date in observed {
        match copy_station_info(catalog, source, dest, &date) {
            Ok(Some(start)) => report.stninfo_copied.push(start),
            Ok(None) => {}
            Err(e) => {
                let message = format!(
                    "Could not create station info for {} at {}: {}",
                    dest,
                    date.stninfo_string(),
                    e
                );
                warn!("{}", message);
                report.warnings.push(message);
            }
        }
    }

    Ok(report)
}

/// One file: rename the row, move the file, commit; undo both on failure
fn migrate_file(
    catalog: &mut dyn Catalog,
    archive: &dyn Archive,
    row: &RinexFile,
    source: &StationId,
    dest: &StationId,
) -> Result<MovedFile> {
    let filename = renamed_filename(&row.filename, source, dest);
    let from = archive.rinex_path(row);
    let to = canonical_path(dest, row.observation_year, row.observation_doy, &filename);

    catalog.begin()?;
    let mut file_moved = false;
    let outcome = catalog
        .rename_rinex(row, dest, &filename)
        .and_then(|_| {
            archive.move_file(&from, &to)?;
            file_moved = true;
            Ok(())
        })
        .and_then(|_| catalog.commit());

    if let Err(e) = outcome {
        if file_moved {
            if let Err(restore) = archive.move_file(&to, &from) {
                warn!("Could not restore {}: {}", from.display(), restore);
            }
        }
        catalog.rollback()?;
        return Err(e);
    }

    debug!("{} -> {}", from.display(), to.display());
    Ok(MovedFile {
        date: row.date(),
        from,
        to,
    })
}

/// Copy the source record active at `date` to `dest` unless `dest` already
/// has a record there
fn copy_station_info(
    catalog: &mut dyn Catalog,
    source: &StationId,
    dest: &StationId,
    date: &GnssDate,
) -> Result<Option<GnssDate>> {
    let mut dest_store = StationInfoStore::load(&*catalog, dest, None, true)?;
    if dest_store.record_at(date).is_ok() {
        return Ok(None);
    }

    let source_store = StationInfoStore::load(&*catalog, source, None, false)?;
    let record = source_store.record_at(date)?.retagged(dest);
    dest_store.insert(catalog, &record)?;
    info!(
        "Copied station info of {} starting {} to {}",
        source,
        record.date_start.stninfo_string(),
        dest
    );
    Ok(Some(record.date_start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adapters::archive::FsArchive;
    use crate::app::adapters::memory_catalog::{CatalogState, MemoryConnector};
    use crate::app::models::{Station, StationInfoRecord};
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const RECEIVER: &str = "ASHTECH UZ-12";
    const ANTENNA: &str = "ASH701945E_M";

    fn day(doy: u32) -> GnssDate {
        GnssDate::from_year_doy(2019, doy).unwrap()
    }

    fn source() -> StationId {
        StationId::new("arg", "vbca")
    }

    fn dest() -> StationId {
        StationId::new("igs", "vbca")
    }

    fn renamed_dest() -> StationId {
        StationId::new("igs", "bca2")
    }

    fn create_test_rinex(station: &StationId, doy: u32) -> RinexFile {
        RinexFile::new(
            station.clone(),
            day(doy),
            day(doy).at_time(23, 59, 30).unwrap(),
            format!("{}{:03}0.19o", station.station_code, doy),
        )
        .unwrap()
    }

    /// Source with files on days 1..=count, both stations registered
    fn create_test_setup(count: u32, target: &StationId) -> (TempDir, FsArchive, MemoryConnector) {
        let dir = TempDir::new().unwrap();
        let archive = FsArchive::new(dir.path());

        let mut state = CatalogState::default();
        state.stations = vec![Station::new(source()), Station::new(target.clone())];
        state.receivers.insert(RECEIVER.to_string());
        state.antennas.insert(ANTENNA.to_string());
        state.station_info.push(StationInfoRecord::new(source(), day(1), RECEIVER, ANTENNA));
        for doy in 1..=count {
            let row = create_test_rinex(&source(), doy);
            let path = archive.absolute(&archive.rinex_path(&row));
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("day {}", doy)).unwrap();
            state.rinex.push(row);
        }
        (dir, archive, MemoryConnector::new(state))
    }

    /// Archive whose n-th move (1-based) fails
    struct FailingArchive {
        inner: FsArchive,
        fail_on: usize,
        moves: AtomicUsize,
    }

    impl Archive for FailingArchive {
        fn exists(&self, relative: &Path) -> Result<bool> {
            self.inner.exists(relative)
        }

        fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
            let n = self.moves.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on {
                return Err(Error::io(
                    "simulated move failure",
                    std::io::Error::other("disk full"),
                ));
            }
            self.inner.move_file(from, to)
        }
    }

    #[test]
    fn test_renamed_filename() {
        assert_eq!(renamed_filename("vbca0010.19o", &source(), &renamed_dest()), "bca20010.19o");
        assert_eq!(renamed_filename("VBCA0010.19O", &source(), &renamed_dest()), "BCA20010.19O");
        assert_eq!(renamed_filename("other.19o", &source(), &renamed_dest()), "other.19o");
    }

    #[test]
    fn test_merge_moves_rows_files_and_station_info() {
        let (_dir, archive, connector) = create_test_setup(3, &renamed_dest());
        let mut catalog = connector.catalog();
        let range = DateRange::new(day(1), day(10)).unwrap();

        let report = merge_station(&mut catalog, &archive, &source(), &renamed_dest(), &range).unwrap();
        assert_eq!(report.moved.len(), 3);
        assert_eq!(
            report.moved[0].to,
            PathBuf::from("igs/bca2/2019/001/bca20010.19d.Z")
        );
        for moved in &report.moved {
            assert!(!archive.exists(&moved.from).unwrap());
            assert!(archive.exists(&moved.to).unwrap());
        }

        let state = connector.snapshot().unwrap();
        assert!(state.rinex.iter().all(|r| r.station == renamed_dest()));

        // the source record is copied once and covers every moved day
        assert_eq!(report.stninfo_copied, vec![day(1)]);
        assert!(report.warnings.is_empty());
        let copied: Vec<_> = state
            .station_info
            .iter()
            .filter(|r| r.station == renamed_dest())
            .collect();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].receiver_code, RECEIVER);
    }

    #[test]
    fn test_failure_on_file_m_rolls_back_only_that_file() {
        let (_dir, inner, connector) = create_test_setup(5, &dest());
        let archive = FailingArchive {
            inner,
            fail_on: 3,
            moves: AtomicUsize::new(0),
        };
        let mut catalog = connector.catalog();
        let range = DateRange::new(day(1), day(5)).unwrap();

        let err = merge_station(&mut catalog, &archive, &source(), &dest(), &range).unwrap_err();
        match err {
            Error::TransactionFailure { file, .. } => assert_eq!(file, "vbca0030.19o"),
            other => panic!("expected TransactionFailure, got {:?}", other),
        }
        assert!(!catalog.in_transaction());

        let state = connector.snapshot().unwrap();
        let owner = |doy: u32| {
            state
                .rinex
                .iter()
                .find(|r| r.observation_doy == doy)
                .map(|r| r.station.clone())
                .unwrap()
        };
        assert_eq!(owner(1), dest());
        assert_eq!(owner(2), dest());
        assert_eq!(owner(3), source());
        assert_eq!(owner(4), source());
        assert_eq!(owner(5), source());

        let src_path = |doy: u32| archive.inner.rinex_path(&create_test_rinex(&source(), doy));
        assert!(!archive.exists(&src_path(1)).unwrap());
        assert!(archive.exists(&src_path(3)).unwrap());
        assert!(archive.exists(&src_path(5)).unwrap());
    }

    #[test]
    fn test_unknown_destination() {
        let (_dir, archive, connector) = create_test_setup(1, &dest());
        let mut catalog = connector.catalog();
        let range = DateRange::new(day(1), day(5)).unwrap();

        let err = merge_station(
            &mut catalog,
            &archive,
            &source(),
            &StationId::new("igs", "none"),
            &range,
        )
        .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(connector.snapshot().unwrap().rinex[0].station, source());
    }

    #[test]
    fn test_existing_destination_coverage_is_kept() {
        let (_dir, archive, connector) = create_test_setup(2, &dest());
        {
            let mut catalog = connector.catalog();
            catalog
                .insert_station_info(&StationInfoRecord::new(dest(), day(1) - 30, RECEIVER, ANTENNA))
                .unwrap();
        }
        let mut catalog = connector.catalog();
        let range = DateRange::new(day(1), day(2)).unwrap();

        let report = merge_station(&mut catalog, &archive, &source(), &dest(), &range).unwrap();
        assert!(report.stninfo_copied.is_empty());
        let dest_records = connector
            .snapshot()
            .unwrap()
            .station_info
            .into_iter()
            .filter(|r| r.station == dest())
            .count();
        assert_eq!(dest_records, 1);
    }
}
