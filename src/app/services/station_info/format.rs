//! Text rendering and parsing of station-info records
//!
//! The long format follows the fixed-column `station.info` layout; the short
//! format only shows dates, receiver and antenna.

use crate::app::models::{HeightCode, StationId, StationInfoRecord, parse_offset};
use crate::constants::{DEFAULT_HEIGHT_CODE, NO_RADOME};
use crate::date::{format_stninfo_datetime, parse_stninfo_datetime};
use crate::{Error, Result};
use std::str::FromStr;

/// Output style for printed station info
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StationInfoFormat {
    Long,
    Short,
}

/// Column widths of the long format, in order
const COLUMNS: [(&str, usize); 15] = [
    ("SITE", 4),
    ("Station Name", 16),
    ("Session Start", 17),
    ("Session Stop", 17),
    ("Ant Ht", 8),
    ("HtCod", 5),
    ("Ant N", 8),
    ("Ant E", 8),
    ("Receiver Type", 20),
    ("Receiver Vers", 20),
    ("SwVer", 11),
    ("Receiver SN", 20),
    ("Antenna Type", 15),
    ("Dome", 5),
    ("Antenna SN", 20),
];

const SEPARATOR: &str = "  ";

fn join_columns(values: &[String]) -> String {
    let cells: Vec<String> = values
        .iter()
        .zip(COLUMNS.iter())
        .map(|(value, (_, width))| {
            let clipped: String = value.chars().take(*width).collect();
            format!("{:<width$}", clipped, width = width)
        })
        .collect();
    format!(" {}", cells.join(SEPARATOR)).trim_end().to_string()
}

/// Header line of the long format (starts with `*`)
pub fn long_header() -> String {
    let names: Vec<String> = COLUMNS.iter().map(|(name, _)| name.to_string()).collect();
    let mut header = join_columns(&names);
    header.replace_range(0..1, "*");
    header
}

pub fn format_record(record: &StationInfoRecord, style: StationInfoFormat) -> String {
    match style {
        StationInfoFormat::Long => join_columns(&[
            record.station.station_code.to_uppercase(),
            record.station.to_string(),
            record.date_start.stninfo_string(),
            format_stninfo_datetime(record.date_end.as_ref()),
            format!("{:>8.4}", record.antenna_height),
            record.height_code.to_string(),
            format!("{:>8.4}", record.antenna_north),
            format!("{:>8.4}", record.antenna_east),
            record.receiver_code.clone(),
            record.receiver_vers.clone(),
            record.receiver_firmware.clone(),
            record.receiver_serial.clone(),
            record.antenna_code.clone(),
            record.radome_code.clone(),
            record.antenna_serial.clone(),
        ]),
        StationInfoFormat::Short => format!(
            "{} {} {:<20} {:<20} {:<15} {:<5}",
            record.date_start.stninfo_string(),
            format_stninfo_datetime(record.date_end.as_ref()),
            record.receiver_code,
            record.receiver_serial,
            record.antenna_code,
            record.radome_code
        ),
    }
}

/// Render a whole history in the requested style
pub fn format_history(records: &[StationInfoRecord], style: StationInfoFormat) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    if style == StationInfoFormat::Long {
        lines.push(long_header());
    }
    lines.extend(records.iter().map(|r| format_record(r, style)));
    lines.join("\n")
}

/// Parse one long-format line
///
/// The station name column carries `net.stn`; when it does not, the record
/// is assigned to `default_network`. Header and comment lines (`*`) yield
/// `Ok(None)`.
pub fn parse_stninfo_line(line: &str, default_network: &str) -> Result<Option<StationInfoRecord>> {
    if line.trim().is_empty() || line.trim_start().starts_with('*') {
        return Ok(None);
    }

    let chars: Vec<char> = line.chars().collect();
    let mut fields = Vec::with_capacity(COLUMNS.len());
    let mut offset = 1;
    for (_, width) in COLUMNS {
        let end = (offset + width).min(chars.len());
        let field: String = chars.get(offset.min(end)..end).unwrap_or(&[]).iter().collect();
        fields.push(field.trim().to_string());
        offset += width + SEPARATOR.len();
    }

    let site = &fields[0];
    if site.is_empty() {
        return Err(Error::validation(format!("Missing station code in '{}'", line)));
    }
    let station = StationId::from_str(&fields[1])
        .unwrap_or_else(|_| StationId::new(default_network, site.as_str()));

    let date_start = parse_stninfo_datetime(&fields[2])?.ok_or_else(|| {
        Error::validation(format!("Station info for {} has an open DateStart", station))
    })?;
    let date_end = parse_stninfo_datetime(&fields[3])?;

    let height_code = if fields[5].is_empty() {
        HeightCode::from_str(DEFAULT_HEIGHT_CODE)?
    } else {
        HeightCode::from_str(&fields[5])?
    };

    let mut record = StationInfoRecord::new(station, date_start, &fields[8], &fields[12])
        .with_date_end(date_end)
        .with_offsets(
            parse_offset("AntennaHeight", &fields[4])?,
            parse_offset("AntennaNorth", &fields[6])?,
            parse_offset("AntennaEast", &fields[7])?,
            height_code,
        )
        .with_receiver_firmware(&fields[10])
        .with_receiver_serial(&fields[11])
        .with_antenna_serial(&fields[14]);
    record.receiver_vers = fields[9].clone();
    if !fields[13].is_empty() {
        record.radome_code = fields[13].clone();
    } else {
        record.radome_code = NO_RADOME.to_string();
    }

    record.validate()?;
    Ok(Some(record))
}

/// Parse every record line of a station.info text
pub fn parse_stninfo_text(text: &str, default_network: &str) -> Result<Vec<StationInfoRecord>> {
    let mut records = Vec::new();
    for line in text.lines() {
        if let Some(record) = parse_stninfo_line(line, default_network)? {
            records.push(record);
        }
    }
    Ok(records)
}
