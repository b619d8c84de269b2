//! Application constants for the GNSS integrity checker
//!
//! Default values, allowed code sets and geodetic parameters shared by the
//! services and the CLI.

// =============================================================================
// Station-Info Constants
// =============================================================================

/// Height reference codes accepted in station-info records
pub const HEIGHT_CODES: &[&str] = &[
    "DHTGP", "DHPAB", "SLBDN", "SLBCR", "SLTEP", "DHBCR", "SLHGP", "SLTGN", "DHARP", "SLBCE",
];

/// Height code given to records that do not specify one
pub const DEFAULT_HEIGHT_CODE: &str = "DHARP";

/// Radome code used when an antenna has no radome
pub const NO_RADOME: &str = "NONE";

/// Year written in the station-info text form for an open DateEnd
pub const OPEN_END_YEAR: i32 = 9999;

/// Text form of an open DateEnd
pub const OPEN_END_TEXT: &str = "9999 999 00 00 00";

/// Gaps between consecutive station-info records shorter than this are not gaps
pub const STNINFO_GAP_TOLERANCE_SECS: i64 = 1;

// =============================================================================
// Station Selection
// =============================================================================

/// Networks whose code starts with this character hold unidentified stations
pub const TEMPORARY_NETWORK_PREFIX: char = '?';

/// Keyword selecting every station (or every station of a network with `net.all`)
pub const ALL_STATIONS_KEYWORD: &str = "all";

// =============================================================================
// Temporal Constants
// =============================================================================

/// Default start of a date filter: 1980 day 001
pub const DEFAULT_START_YEAR: i32 = 1980;
pub const DEFAULT_START_DOY: u32 = 1;

/// GPS time origin (1980-01-06)
pub const GPS_EPOCH_YMD: (i32, u32, u32) = (1980, 1, 6);

/// Modified Julian Day origin (1858-11-17)
pub const MJD_EPOCH_YMD: (i32, u32, u32) = (1858, 11, 17);

pub const SECONDS_PER_DAY: i64 = 86_400;

// =============================================================================
// Spatial Coherence
// =============================================================================

/// Radius inside which a station is considered a candidate for a solution
pub const SPATIAL_TOLERANCE_M: f64 = 100.0;

/// Closest-station differences below this distance are not reported
pub const NEGLIGIBLE_DISTANCE_M: f64 = 1.0;

/// Mean Earth radius for great-circle distances
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 semi-major axis
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 first eccentricity
pub const WGS84_E: f64 = 8.181_919_084_262_2e-2;

// =============================================================================
// Gap Visualization
// =============================================================================

/// Days summarized by one glyph of the gap chart
pub const GAP_CHART_DAYS_PER_GLYPH: usize = 2;

/// Years with more plotted days than this are split across several lines
pub const GAP_CHART_WRAP_DAYS: usize = 240;

/// Number of lines used when a year is split
pub const GAP_CHART_LINES: usize = 4;

// =============================================================================
// Performance and Configuration
// =============================================================================

/// Default number of parallel workers
pub const DEFAULT_PARALLEL_WORKERS: usize = 8;

/// Upper bound accepted for `--workers`
pub const MAX_PARALLEL_WORKERS: usize = 256;

/// Name of the directory holding the config file below the user config dir
pub const CONFIG_DIR_NAME: &str = "gnss-integrity";

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment overrides
pub const ENV_ARCHIVE_ROOT: &str = "GNSS_INTEGRITY_ARCHIVE";
pub const ENV_CATALOG_PATH: &str = "GNSS_INTEGRITY_CATALOG";
pub const ENV_WORKERS: &str = "GNSS_INTEGRITY_WORKERS";

/// Progress bar template shared by batch commands
pub const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";

// =============================================================================
// Audit Events
// =============================================================================

/// Module name recorded on events raised by the integrity checker
pub const EVENT_MODULE: &str = "gnss_integrity";

/// Default archive root when nothing else is configured
pub const DEFAULT_ARCHIVE_ROOT: &str = "./archive";

/// Default catalog snapshot when nothing else is configured
pub const DEFAULT_CATALOG_PATH: &str = "./catalog.json";
