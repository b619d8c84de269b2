//! Audit events recorded in the catalog
//!
//! Every destructive action taken by an integrity check (removing a dangling
//! inventory row, deleting a solution) leaves one event behind.

use crate::app::models::StationId;
use crate::constants::EVENT_MODULE;
use crate::date::GnssDate;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Info,
    Warning,
    Error,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EventType::Info => "info",
            EventType::Warning => "warning",
            EventType::Error => "error",
        };
        f.write_str(text)
    }
}

/// Structured audit event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_date: NaiveDateTime,
    pub event_type: EventType,
    pub station: Option<StationId>,
    pub year: Option<i32>,
    pub doy: Option<u32>,
    pub description: String,
    /// Host that raised the event
    pub node: String,
    pub module: String,
}

impl Event {
    pub fn new(event_type: EventType, description: impl Into<String>) -> Self {
        Self {
            event_date: Utc::now().naive_utc(),
            event_type,
            station: None,
            year: None,
            doy: None,
            description: description.into(),
            node: sysinfo::System::host_name().unwrap_or_default(),
            module: EVENT_MODULE.to_string(),
        }
    }

    pub fn info(description: impl Into<String>) -> Self {
        Self::new(EventType::Info, description)
    }

    pub fn warning(description: impl Into<String>) -> Self {
        Self::new(EventType::Warning, description)
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::new(EventType::Error, description)
    }

    pub fn with_station(mut self, station: &StationId) -> Self {
        self.station = Some(station.clone());
        self
    }

    /// Attach the observation day the event refers to
    pub fn with_date(mut self, date: &GnssDate) -> Self {
        self.year = Some(date.year());
        self.doy = Some(date.doy());
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Copy with text fields made safe for storage
    ///
    /// Non-ASCII characters are dropped, single quotes become double quotes and
    /// anything from a `BASH` or `PSQL` marker to the end of its line is cut.
    pub fn sanitized(&self) -> Self {
        Self {
            description: sanitize_text(&self.description),
            node: sanitize_text(&self.node),
            module: sanitize_text(&self.module),
            ..self.clone()
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

fn sanitize_text(text: &str) -> String {
    let ascii: String = text
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '\'' { '"' } else { c })
        .collect();

    ascii
        .split('\n')
        .map(|line| {
            let cut = ["BASH", "PSQL"]
                .iter()
                .filter_map(|marker| line.find(marker))
                .min()
                .unwrap_or(line.len());
            &line[..cut]
        })
        .collect::<Vec<_>>()
        .join("\n")
}
