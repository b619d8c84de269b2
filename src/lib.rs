//! GNSS Integrity Library
//!
//! Quality-control and metadata-consistency checks over a GNSS observation
//! archive and its relational catalog.
//!
//! This library provides tools for:
//! - Holding and validating per-station station-info interval histories
//! - Reconciling the RINEX inventory against the archive and the station info
//! - Matching PPP positions back to the declared station within a tolerance
//! - Dispatching per-station checks across a bounded worker pool
//! - Merging one station's inventory into another, one transaction per file

pub mod config;
pub mod constants;
pub mod date;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod dispatcher;
        pub mod rinex_reconciler;
        pub mod solutions;
        pub mod spatial;
        pub mod station_info;
        pub mod station_merge;
        pub mod station_selection;
    }
    pub mod adapters {
        pub mod archive;
        pub mod catalog;
        pub mod memory_catalog;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Event, HeightCode, PppSolution, RinexFile, StationId, StationInfoRecord};
pub use config::Config;
pub use date::GnssDate;

/// Result type alias for the integrity checker
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for catalog, archive and integrity-check operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A station or record does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// No station-info interval contains the requested date
    #[error("No station info record for {station} covers {date}")]
    NoApplicableRecord { station: String, date: String },

    /// A station-info record overlaps another record of the same station
    #[error("Station info conflict for {station}: {message}")]
    IntervalConflict { station: String, message: String },

    /// Malformed field or inconsistent record
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Catalog connectivity or query failure
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// Per-file merge transaction failed and was rolled back
    #[error("Transaction failed while migrating '{file}'")]
    TransactionFailure {
        file: String,
        #[source]
        source: Box<Error>,
    },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Date could not be decoded
    #[error("Date parsing error: {message}")]
    DateParsing { message: String },

    /// A dispatched job panicked or could not be joined
    #[error("Job '{label}' failed: {reason}")]
    Job { label: String, reason: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an error for a date outside every station-info interval
    pub fn no_applicable_record(station: impl ToString, date: impl ToString) -> Self {
        Self::NoApplicableRecord {
            station: station.to_string(),
            date: date.to_string(),
        }
    }

    /// Create an interval conflict error
    pub fn interval_conflict(station: impl ToString, message: impl Into<String>) -> Self {
        Self::IntervalConflict {
            station: station.to_string(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a catalog error
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Wrap the error that aborted a per-file merge transaction
    pub fn transaction_failure(file: impl Into<String>, source: Error) -> Self {
        Self::TransactionFailure {
            file: file.into(),
            source: Box::new(source),
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a date parsing error
    pub fn date_parsing(message: impl Into<String>) -> Self {
        Self::DateParsing {
            message: message.into(),
        }
    }

    /// Create a job failure
    pub fn job(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Job {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// True for the two "nothing applies" variants
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoApplicableRecord { .. })
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Catalog {
            message: format!("Catalog snapshot could not be decoded: {}", error),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid config file: {}", error),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(error: regex::Error) -> Self {
        Self::Validation {
            message: format!("Invalid pattern: {}", error),
        }
    }
}

impl From<chrono::ParseError> for Error {
    fn from(error: chrono::ParseError) -> Self {
        Self::DateParsing {
            message: error.to_string(),
        }
    }
}
