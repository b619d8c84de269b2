//! Station-info history proposed from RINEX header metadata
//!
//! Used to bootstrap missing metadata. The proposal is returned to the caller
//! and never written to the catalog.

use crate::app::models::{Equipment, HeightCode, RinexFile, StationId, StationInfoRecord};
use crate::constants::NO_RADOME;
use crate::date::GnssDate;

/// Consecutive observations sharing one equipment setup
#[derive(Debug, Clone)]
struct Span {
    equipment: Equipment,
    start: GnssDate,
    end: GnssDate,
    files: usize,
}

impl Span {
    fn days(&self) -> i64 {
        self.start.days_until(&self.end) + 1
    }
}

fn group_spans(rinex: &[RinexFile]) -> Vec<Span> {
    let mut sorted: Vec<&RinexFile> = rinex.iter().collect();
    sorted.sort_by_key(|r| r.observation_stime);

    let mut spans: Vec<Span> = Vec::new();
    for file in sorted {
        let equipment = file.equipment();
        match spans.last_mut() {
            Some(span) if span.equipment == equipment => {
                span.end = span.end.max(file.observation_etime);
                span.files += 1;
            }
            _ => spans.push(Span {
                equipment,
                start: file.observation_stime,
                end: file.observation_etime,
                files: 1,
            }),
        }
    }
    spans
}

fn merge_neighbours(spans: Vec<Span>) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(previous) if previous.equipment == span.equipment => {
                previous.end = previous.end.max(span.end);
                previous.files += span.files;
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Propose a back-to-back station-info history from inventory metadata
///
/// Consecutive observations with identical receiver/antenna metadata form one
/// record. With `ignore_days > 0`, setups lasting `ignore_days` days or less
/// are dropped and their neighbours re-merged. Each record ends where the next
/// one starts; the last record is left open.
pub fn propose_from_observations(
    station: &StationId,
    rinex: &[RinexFile],
    ignore_days: i64,
) -> Vec<StationInfoRecord> {
    let mut spans = group_spans(rinex);
    if ignore_days > 0 {
        spans.retain(|s| s.days() > ignore_days);
        spans = merge_neighbours(spans);
    }

    let starts: Vec<GnssDate> = spans.iter().map(|s| s.start).collect();
    spans
        .into_iter()
        .enumerate()
        .map(|(i, span)| {
            let equipment = &span.equipment;
            let radome = if equipment.antenna_dome.trim().is_empty() {
                NO_RADOME.to_string()
            } else {
                equipment.antenna_dome.clone()
            };
            let mut record = StationInfoRecord::new(
                station.clone(),
                span.start,
                &equipment.receiver_type,
                &equipment.antenna_type,
            )
            .with_date_end(starts.get(i + 1).copied())
            .with_receiver_serial(&equipment.receiver_serial)
            .with_receiver_firmware(&equipment.receiver_firmware)
            .with_antenna_serial(&equipment.antenna_serial)
            .with_radome(radome)
            .with_offsets(
                equipment.antenna_offset_um as f64 / 1_000_000.0,
                0.0,
                0.0,
                HeightCode::default(),
            )
            .with_comments(format!("Proposed from {} RINEX files", span.files));
            record.receiver_vers = equipment.receiver_firmware.clone();
            record
        })
        .collect()
}
