//! In-memory catalog backed by a JSON snapshot
//!
//! All connections opened from one [`MemoryConnector`] share the committed
//! state. A transaction reads and writes a private copy and records the
//! mutations it made; commit replays them onto the shared state under the
//! write lock, so concurrent writers touching other rows are not lost and
//! the last commit wins on conflicting rows.

use crate::app::adapters::catalog::{Catalog, CatalogConnector, RinexTable};
use crate::app::models::{
    Event, PppSolution, RinexFile, SolutionKey, Station, StationId, StationInfoRecord,
};
use crate::date::{DateRange, GnssDate};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Every table of the catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogState {
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub station_info: Vec<StationInfoRecord>,
    #[serde(default)]
    pub rinex: Vec<RinexFile>,
    #[serde(default)]
    pub ppp_solutions: Vec<PppSolution>,
    #[serde(default)]
    pub excluded_solutions: BTreeSet<SolutionKey>,
    #[serde(default)]
    pub antennas: BTreeSet<String>,
    #[serde(default)]
    pub receivers: BTreeSet<String>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl CatalogState {
    /// One row per station-day, keeping the best completion
    fn processed_rinex(&self) -> Vec<&RinexFile> {
        let mut best: HashMap<(&StationId, i32, u32), &RinexFile> = HashMap::new();
        for file in &self.rinex {
            let key = (&file.station, file.observation_year, file.observation_doy);
            match best.get(&key) {
                Some(current) if current.completion >= file.completion => {}
                _ => {
                    best.insert(key, file);
                }
            }
        }
        best.into_values().collect()
    }

    fn rinex_view(&self, table: RinexTable) -> Vec<&RinexFile> {
        match table {
            RinexTable::Archive => self.rinex.iter().collect(),
            RinexTable::Processed => self.processed_rinex(),
        }
    }

    fn find_rinex(&self, file: &RinexFile) -> Option<usize> {
        self.rinex.iter().position(|row| {
            row.station == file.station
                && row.filename == file.filename
                && row.observation_stime == file.observation_stime
        })
    }

    fn find_station_info(&self, record: &StationInfoRecord) -> Option<usize> {
        self.station_info
            .iter()
            .position(|row| row.station == record.station && row.date_start == record.date_start)
    }
}

/// A write recorded inside a transaction
#[derive(Debug, Clone)]
enum Mutation {
    InsertStationInfo(StationInfoRecord),
    UpdateStationInfo(StationInfoRecord, StationInfoRecord),
    DeleteStationInfo(StationInfoRecord),
    RemoveRinex(RinexFile),
    RenameRinex(RinexFile, StationId, String),
    ExcludeSolution(SolutionKey),
    DeleteSolution(SolutionKey),
    InsertEvent(Event),
}

fn apply(state: &mut CatalogState, mutation: &Mutation) -> Result<bool> {
    match mutation {
        Mutation::InsertStationInfo(record) => {
            if state.find_station_info(record).is_some() {
                return Err(Error::catalog(format!(
                    "Duplicate station info key for {} at {}",
                    record.station,
                    record.date_start.stninfo_string()
                )));
            }
            state.station_info.push(record.clone());
            Ok(true)
        }
        Mutation::UpdateStationInfo(old, new) => {
            let index = state.find_station_info(old).ok_or_else(|| {
                Error::not_found(format!(
                    "Station info for {} starting {}",
                    old.station,
                    old.date_start.stninfo_string()
                ))
            })?;
            state.station_info[index] = new.clone();
            Ok(true)
        }
        Mutation::DeleteStationInfo(record) => {
            let index = state.find_station_info(record).ok_or_else(|| {
                Error::not_found(format!(
                    "Station info for {} starting {}",
                    record.station,
                    record.date_start.stninfo_string()
                ))
            })?;
            state.station_info.remove(index);
            Ok(true)
        }
        Mutation::RemoveRinex(file) => {
            let index = state.find_rinex(file).ok_or_else(|| {
                Error::not_found(format!("Inventory row {} for {}", file.filename, file.station))
            })?;
            state.rinex.remove(index);

            let day_still_observed = state.rinex.iter().any(|row| {
                row.station == file.station
                    && row.observation_year == file.observation_year
                    && row.observation_doy == file.observation_doy
            });
            if !day_still_observed {
                let key = SolutionKey {
                    station: file.station.clone(),
                    year: file.observation_year,
                    doy: file.observation_doy,
                };
                state.ppp_solutions.retain(|s| s.key() != key);
                state.excluded_solutions.remove(&key);
            }
            Ok(true)
        }
        Mutation::RenameRinex(file, dest, filename) => {
            let index = state.find_rinex(file).ok_or_else(|| {
                Error::not_found(format!("Inventory row {} for {}", file.filename, file.station))
            })?;
            let row = &mut state.rinex[index];
            row.station = dest.clone();
            row.filename = filename.clone();
            Ok(true)
        }
        Mutation::ExcludeSolution(key) => Ok(state.excluded_solutions.insert(key.clone())),
        Mutation::DeleteSolution(key) => {
            let before = state.ppp_solutions.len();
            state.ppp_solutions.retain(|s| s.key() != *key);
            state.excluded_solutions.remove(key);
            Ok(state.ppp_solutions.len() != before)
        }
        Mutation::InsertEvent(event) => {
            state.events.push(event.sanitized());
            Ok(true)
        }
    }
}

fn poisoned() -> Error {
    Error::catalog("Catalog state lock poisoned by a panicked writer")
}

// =============================================================================
// Connector
// =============================================================================

/// Hands out connections sharing one committed state
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    shared: Arc<RwLock<CatalogState>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryConnector {
    pub fn new(state: CatalogState) -> Self {
        Self {
            shared: Arc::new(RwLock::new(state)),
            snapshot_path: None,
        }
    }

    /// Load a catalog snapshot written by [`MemoryConnector::save`]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::not_found(format!(
                "Catalog snapshot {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read catalog {}", path.display()), e)
        })?;
        let state: CatalogState = serde_json::from_str(&content)?;
        info!(
            "Loaded catalog {} ({} stations, {} inventory rows)",
            path.display(),
            state.stations.len(),
            state.rinex.len()
        );
        Ok(Self {
            shared: Arc::new(RwLock::new(state)),
            snapshot_path: Some(path.to_path_buf()),
        })
    }

    /// Write the committed state back to the snapshot it was loaded from
    pub fn save(&self) -> Result<()> {
        match &self.snapshot_path {
            Some(path) => self.save_to(path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let state = self.snapshot()?;
        let content = serde_json::to_string_pretty(&state)?;
        std::fs::write(path, content).map_err(|e| {
            Error::io(format!("Failed to write catalog {}", path.display()), e)
        })?;
        debug!("Catalog written to {}", path.display());
        Ok(())
    }

    /// Copy of the committed state
    pub fn snapshot(&self) -> Result<CatalogState> {
        self.shared.read().map(|s| s.clone()).map_err(|_| poisoned())
    }

    pub fn catalog(&self) -> MemoryCatalog {
        MemoryCatalog {
            shared: Arc::clone(&self.shared),
            transaction: None,
        }
    }
}

impl CatalogConnector for MemoryConnector {
    fn connect(&self) -> Result<Box<dyn Catalog>> {
        Ok(Box::new(self.catalog()))
    }
}

// =============================================================================
// Connection
// =============================================================================

#[derive(Debug)]
struct Transaction {
    state: CatalogState,
    log: Vec<Mutation>,
}

/// One connection to the in-memory catalog
#[derive(Debug)]
pub struct MemoryCatalog {
    shared: Arc<RwLock<CatalogState>>,
    transaction: Option<Transaction>,
}

impl MemoryCatalog {
    fn read<T>(&self, query: impl FnOnce(&CatalogState) -> T) -> Result<T> {
        match &self.transaction {
            Some(tx) => Ok(query(&tx.state)),
            None => self.shared.read().map(|s| query(&s)).map_err(|_| poisoned()),
        }
    }

    fn write(&mut self, mutation: Mutation) -> Result<bool> {
        match &mut self.transaction {
            Some(tx) => {
                let changed = apply(&mut tx.state, &mutation)?;
                tx.log.push(mutation);
                Ok(changed)
            }
            None => {
                let mut state = self.shared.write().map_err(|_| poisoned())?;
                apply(&mut state, &mutation)
            }
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }
}

impl Catalog for MemoryCatalog {
    fn stations(&self) -> Result<Vec<Station>> {
        self.read(|s| {
            let mut stations = s.stations.clone();
            stations.sort_by(|a, b| a.id.cmp(&b.id));
            stations
        })
    }

    fn station(&self, id: &StationId) -> Result<Option<Station>> {
        self.read(|s| s.stations.iter().find(|st| st.id == *id).cloned())
    }

    fn station_info_records(&self, id: &StationId) -> Result<Vec<StationInfoRecord>> {
        self.read(|s| {
            let mut records: Vec<StationInfoRecord> = s
                .station_info
                .iter()
                .filter(|r| r.station == *id)
                .cloned()
                .collect();
            records.sort_by(|a, b| a.date_start.cmp(&b.date_start));
            records
        })
    }

    fn insert_station_info(&mut self, record: &StationInfoRecord) -> Result<()> {
        self.write(Mutation::InsertStationInfo(record.clone()))
            .map(|_| ())
    }

    fn update_station_info(
        &mut self,
        old: &StationInfoRecord,
        new: &StationInfoRecord,
    ) -> Result<()> {
        self.write(Mutation::UpdateStationInfo(old.clone(), new.clone()))
            .map(|_| ())
    }

    fn delete_station_info(&mut self, record: &StationInfoRecord) -> Result<()> {
        self.write(Mutation::DeleteStationInfo(record.clone()))
            .map(|_| ())
    }

    fn antenna_exists(&self, antenna_code: &str) -> Result<bool> {
        self.read(|s| s.antennas.contains(antenna_code.trim()))
    }

    fn receiver_exists(&self, receiver_code: &str) -> Result<bool> {
        self.read(|s| s.receivers.contains(receiver_code.trim()))
    }

    fn rinex_in_range(
        &self,
        id: &StationId,
        range: &DateRange,
        table: RinexTable,
    ) -> Result<Vec<RinexFile>> {
        self.read(|s| {
            let mut rows: Vec<RinexFile> = s
                .rinex_view(table)
                .into_iter()
                .filter(|r| r.station == *id && range.contains_day(&r.observation_stime))
                .cloned()
                .collect();
            rows.sort_by(|a, b| {
                a.observation_stime
                    .cmp(&b.observation_stime)
                    .then_with(|| a.filename.cmp(&b.filename))
            });
            rows
        })
    }

    fn rinex_count_between(
        &self,
        id: &StationId,
        after: &GnssDate,
        before: &GnssDate,
    ) -> Result<usize> {
        self.read(|s| {
            s.processed_rinex()
                .into_iter()
                .filter(|r| {
                    r.station == *id && r.observation_stime > *after && r.observation_stime < *before
                })
                .count()
        })
    }

    fn rinex_time_span(&self, id: &StationId) -> Result<Option<(GnssDate, GnssDate)>> {
        self.read(|s| {
            let starts = s
                .processed_rinex()
                .into_iter()
                .filter(|r| r.station == *id)
                .map(|r| r.observation_stime);
            starts.fold(None, |span, t| match span {
                None => Some((t, t)),
                Some((first, last)) => Some((first.min(t), last.max(t))),
            })
        })
    }

    fn remove_rinex(&mut self, file: &RinexFile) -> Result<()> {
        self.write(Mutation::RemoveRinex(file.clone())).map(|_| ())
    }

    fn rename_rinex(&mut self, file: &RinexFile, dest: &StationId, filename: &str) -> Result<()> {
        self.write(Mutation::RenameRinex(
            file.clone(),
            dest.clone(),
            filename.to_string(),
        ))
        .map(|_| ())
    }

    fn ppp_solutions(&self, id: &StationId, range: &DateRange) -> Result<Vec<PppSolution>> {
        self.read(|s| {
            let mut solutions: Vec<PppSolution> = s
                .ppp_solutions
                .iter()
                .filter(|p| p.station == *id)
                .filter(|p| p.date().is_ok_and(|d| range.contains_day(&d)))
                .cloned()
                .collect();
            solutions.sort_by_key(|p| (p.year, p.doy));
            solutions
        })
    }

    fn exclude_solution(&mut self, key: &SolutionKey) -> Result<bool> {
        self.write(Mutation::ExcludeSolution(key.clone()))
    }

    fn delete_solution(&mut self, key: &SolutionKey) -> Result<bool> {
        self.write(Mutation::DeleteSolution(key.clone()))
    }

    fn insert_event(&mut self, event: &Event) -> Result<()> {
        self.write(Mutation::InsertEvent(event.clone())).map(|_| ())
    }

    fn begin(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(Error::catalog("A transaction is already open"));
        }
        let state = self.shared.read().map_err(|_| poisoned())?.clone();
        self.transaction = Some(Transaction {
            state,
            log: Vec::new(),
        });
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| Error::catalog("Commit without an open transaction"))?;

        let mut shared = self.shared.write().map_err(|_| poisoned())?;
        let mut replayed = shared.clone();
        for mutation in &tx.log {
            apply(&mut replayed, mutation)
                .map_err(|e| Error::catalog(format!("Commit failed: {}", e)))?;
        }
        *shared = replayed;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if let Some(tx) = self.transaction.take() {
            debug!("Rolled back {} pending catalog writes", tx.log.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(doy: u32) -> GnssDate {
        GnssDate::from_year_doy(2020, doy).unwrap()
    }

    fn rinex(id: &StationId, doy: u32, completion: f64) -> RinexFile {
        RinexFile::new(
            id.clone(),
            day(doy),
            day(doy).at_time(23, 59, 30).unwrap(),
            format!("{}{:03}0.20o", id.station_code, doy),
        )
        .unwrap()
        .with_completion(completion)
    }

    fn connector_with_rinex() -> (MemoryConnector, StationId) {
        let id = StationId::new("igs", "braz");
        let mut state = CatalogState::default();
        state.stations.push(Station::new(id.clone()));
        state.rinex.push(rinex(&id, 10, 0.5));
        let mut better = rinex(&id, 10, 0.9);
        better.filename = "braz0101.20o".to_string();
        state.rinex.push(better);
        state.rinex.push(rinex(&id, 11, 1.0));
        state
            .ppp_solutions
            .push(PppSolution::new(id.clone(), 2020, 11, [1.0, 2.0, 3.0]));
        (MemoryConnector::new(state), id)
    }

    #[test]
    fn test_processed_view_keeps_best_completion() {
        let (connector, id) = connector_with_rinex();
        let catalog = connector.catalog();
        let range = DateRange::new(day(1), day(30)).unwrap();

        let archive = catalog.rinex_in_range(&id, &range, RinexTable::Archive).unwrap();
        assert_eq!(archive.len(), 3);

        let processed = catalog
            .rinex_in_range(&id, &range, RinexTable::Processed)
            .unwrap();
        assert_eq!(processed.len(), 2);
        assert_eq!(processed[0].completion, 0.9);
    }

    #[test]
    fn test_remove_cascades_to_solutions() {
        let (connector, id) = connector_with_rinex();
        let mut catalog = connector.catalog();
        catalog.remove_rinex(&rinex(&id, 11, 1.0)).unwrap();

        let state = connector.snapshot().unwrap();
        assert!(state.ppp_solutions.is_empty());
        assert!(catalog.remove_rinex(&rinex(&id, 11, 1.0)).is_err());
    }

    #[test]
    fn test_rollback_discards_writes() {
        let (connector, id) = connector_with_rinex();
        let mut catalog = connector.catalog();
        catalog.begin().unwrap();
        catalog
            .rename_rinex(&rinex(&id, 11, 1.0), &StationId::new("igs", "new1"), "new10110.20o")
            .unwrap();
        assert!(catalog.begin().is_err());
        catalog.rollback().unwrap();

        let state = connector.snapshot().unwrap();
        assert!(state.rinex.iter().all(|r| r.station == id));
    }

    #[test]
    fn test_commit_replays_onto_shared_state() {
        let (connector, id) = connector_with_rinex();
        let mut first = connector.catalog();
        let mut second = connector.catalog();

        first.begin().unwrap();
        first.remove_rinex(&rinex(&id, 11, 1.0)).unwrap();

        // a concurrent writer commits while the transaction is open
        second.insert_event(&Event::info("concurrent")).unwrap();

        first.commit().unwrap();
        let state = connector.snapshot().unwrap();
        assert_eq!(state.rinex.len(), 2);
        assert_eq!(state.events.len(), 1);
        assert!(first.commit().is_err());
    }

    #[test]
    fn test_exclusion_reports_duplicates() {
        let (connector, id) = connector_with_rinex();
        let mut catalog = connector.catalog();
        let key = SolutionKey {
            station: id,
            year: 2020,
            doy: 11,
        };
        assert!(catalog.exclude_solution(&key).unwrap());
        assert!(!catalog.exclude_solution(&key).unwrap());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (connector, id) = connector_with_rinex();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        connector.save_to(&path).unwrap();

        let loaded = MemoryConnector::load(&path).unwrap();
        let catalog = loaded.connect().unwrap();
        assert_eq!(catalog.rinex_time_span(&id).unwrap().unwrap().0, day(10));
        assert!(MemoryConnector::load(&dir.path().join("missing.json")).is_err());
    }
}
