//! Station list expansion
//!
//! Tokens select stations from the catalog: `all`, `net.all`, `net.stn` or a
//! bare `stn` (every network carrying that code). A token with a leading `-`
//! removes matches from the selection. Temporary networks (codes starting
//! with `?`) are never selected.

use crate::app::models::{Station, StationId};
use crate::constants::ALL_STATIONS_KEYWORD;
use crate::{Error, Result};
use std::path::Path;
use tracing::info;

/// Replace a single token naming an existing file with the file's lines
pub fn expand_station_tokens(tokens: &[String]) -> Result<Vec<String>> {
    if let [single] = tokens {
        let path = Path::new(single);
        if path.is_file() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::io(format!("Failed to read station list {}", path.display()), e)
            })?;
            info!("Station list read from file: {}", path.display());
            return Ok(content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect());
        }
    }
    Ok(tokens.to_vec())
}

/// Selected stations, sorted by network then station, without duplicates
pub fn select_stations(stations: &[Station], tokens: &[String]) -> Vec<StationId> {
    let mut known: Vec<&StationId> = stations
        .iter()
        .map(|s| &s.id)
        .filter(|id| !id.is_temporary())
        .collect();
    known.sort_by(|a, b| {
        (&a.network_code, &a.station_code).cmp(&(&b.network_code, &b.station_code))
    });

    let tokens: Vec<String> = tokens.iter().map(|t| t.trim().to_lowercase()).collect();
    let (removals, additions): (Vec<&String>, Vec<&String>) =
        tokens.iter().partition(|t| t.starts_with('-'));

    let mut selected: Vec<StationId> = Vec::new();
    let mut add = |id: &StationId| {
        if !selected.contains(id) {
            selected.push(id.clone());
        }
    };

    for token in additions {
        if token == ALL_STATIONS_KEYWORD {
            known.iter().for_each(|id| add(*id));
            continue;
        }
        match token.split_once('.') {
            Some((net, stn)) if stn == ALL_STATIONS_KEYWORD => known
                .iter()
                .filter(|id| id.network_code == net)
                .for_each(|id| add(*id)),
            Some((net, stn)) => known
                .iter()
                .filter(|id| id.network_code == net && id.station_code == stn)
                .for_each(|id| add(*id)),
            None => known
                .iter()
                .filter(|id| id.station_code == *token)
                .for_each(|id| add(*id)),
        }
    }

    for removal in removals {
        let target = removal.trim_start_matches('-');
        match target.split_once('.') {
            Some(_) => selected.retain(|id| id.to_string() != target),
            None => selected.retain(|id| id.station_code != target),
        }
    }

    selected.sort_by(|a, b| {
        (&a.network_code, &a.station_code).cmp(&(&b.network_code, &b.station_code))
    });
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn catalog_stations() -> Vec<Station> {
        ["igs.braz", "igs.lpgs", "rms.lpgs", "rms.mzac", "?tmp.lpgs"]
            .iter()
            .map(|s| Station::new(s.parse().unwrap()))
            .collect()
    }

    fn select(tokens: &[&str]) -> Vec<String> {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        select_stations(&catalog_stations(), &tokens)
            .iter()
            .map(|id| id.to_string())
            .collect()
    }

    #[test]
    fn test_all_skips_temporary_networks() {
        assert_eq!(select(&["all"]), vec!["igs.braz", "igs.lpgs", "rms.lpgs", "rms.mzac"]);
    }

    #[test]
    fn test_network_and_station_tokens() {
        assert_eq!(select(&["rms.all"]), vec!["rms.lpgs", "rms.mzac"]);
        assert_eq!(select(&["lpgs"]), vec!["igs.lpgs", "rms.lpgs"]);
        assert_eq!(select(&["IGS.BRAZ", "igs.braz"]), vec!["igs.braz"]);
        assert!(select(&["xxx.yyyy"]).is_empty());
    }

    #[test]
    fn test_removals() {
        assert_eq!(select(&["all", "-lpgs"]), vec!["igs.braz", "rms.mzac"]);
        assert_eq!(select(&["all", "-rms.lpgs"]), vec!["igs.braz", "igs.lpgs", "rms.mzac"]);
    }

    #[test]
    fn test_station_list_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "igs.braz\n\n  rms.mzac  ").unwrap();
        let tokens = vec![file.path().display().to_string()];

        let expanded = expand_station_tokens(&tokens).unwrap();
        assert_eq!(expanded, vec!["igs.braz", "rms.mzac"]);

        let plain = vec!["igs.braz".to_string(), "lpgs".to_string()];
        assert_eq!(expand_station_tokens(&plain).unwrap(), plain);
    }
}
