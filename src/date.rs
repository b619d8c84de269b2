//! Temporal types for archive range arithmetic
//!
//! `GnssDate` is a timestamp that can be built from and rendered into every
//! calendar representation used by the archive: year/day-of-year,
//! year/month/day, GPS week/week-day, fractional year and Modified Julian Day.
//! Ordering follows the underlying timestamp so sub-day ordering is kept when a
//! time of day is present.

use crate::constants::{
    DEFAULT_START_DOY, DEFAULT_START_YEAR, GPS_EPOCH_YMD, MJD_EPOCH_YMD, OPEN_END_TEXT,
    OPEN_END_YEAR, SECONDS_PER_DAY,
};
use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A point in time expressed in any of the archive's calendar forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GnssDate(NaiveDateTime);

fn epoch(ymd: (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap_or_default()
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_yo_opt(year, 366).is_some() {
        366
    } else {
        365
    }
}

impl GnssDate {
    /// Build a date at 00:00:00 from year and day-of-year
    pub fn from_year_doy(year: i32, doy: u32) -> Result<Self> {
        NaiveDate::from_yo_opt(year, doy)
            .map(|d| Self(d.and_time(chrono::NaiveTime::MIN)))
            .ok_or_else(|| Error::date_parsing(format!("Invalid year/doy: {} {}", year, doy)))
    }

    /// Build a date at 00:00:00 from year, month and day
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(|d| Self(d.and_time(chrono::NaiveTime::MIN)))
            .ok_or_else(|| {
                Error::date_parsing(format!("Invalid date: {}/{}/{}", year, month, day))
            })
    }

    /// Build a date from a GPS week and week-day (0 = Sunday)
    pub fn from_gps_week(week: i64, week_day: u32) -> Result<Self> {
        if week < 0 || week_day > 6 {
            return Err(Error::date_parsing(format!(
                "Invalid GPS week/day: {}-{}",
                week, week_day
            )));
        }
        week.checked_mul(7)
            .and_then(|days| days.checked_add(week_day as i64))
            .and_then(Duration::try_days)
            .and_then(|offset| epoch(GPS_EPOCH_YMD).checked_add_signed(offset))
            .map(|date| Self(date.and_time(chrono::NaiveTime::MIN)))
            .ok_or_else(|| {
                Error::date_parsing(format!("GPS week/day out of range: {}-{}", week, week_day))
            })
    }

    /// Build a date from a fractional year
    pub fn from_fyear(fyear: f64) -> Result<Self> {
        if !fyear.is_finite() || !(1.0..=9998.0).contains(&fyear) {
            return Err(Error::date_parsing(format!(
                "Invalid fractional year: {}",
                fyear
            )));
        }
        let year = fyear.floor() as i32;
        let seconds = ((fyear - year as f64) * days_in_year(year) as f64 * SECONDS_PER_DAY as f64)
            .round() as i64;
        let start = Self::from_year_doy(year, 1)?;
        Ok(Self(start.0 + Duration::seconds(seconds)))
    }

    /// Build a date from a Modified Julian Day number
    pub fn from_mjd(mjd: i64) -> Self {
        Self((epoch(MJD_EPOCH_YMD) + Duration::days(mjd)).and_time(chrono::NaiveTime::MIN))
    }

    /// The date `days` days earlier, failing outside the representable range
    pub fn checked_sub_days(&self, days: i64) -> Result<Self> {
        Duration::try_days(days)
            .and_then(|offset| self.0.checked_sub_signed(offset))
            .map(Self)
            .ok_or_else(|| {
                Error::date_parsing(format!("{} days before {} is out of range", days, self))
            })
    }

    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self(datetime)
    }

    /// Today's date (UTC) at 00:00:00
    pub fn today() -> Self {
        Self(Utc::now().date_naive().and_time(chrono::NaiveTime::MIN))
    }

    /// Same day at the given time of day
    pub fn at_time(&self, hour: u32, minute: u32, second: u32) -> Result<Self> {
        self.0
            .date()
            .and_hms_opt(hour, minute, second)
            .map(Self)
            .ok_or_else(|| {
                Error::date_parsing(format!("Invalid time: {:02}:{:02}:{:02}", hour, minute, second))
            })
    }

    /// Same day at 00:00:00
    pub fn start_of_day(&self) -> Self {
        Self(self.0.date().and_time(chrono::NaiveTime::MIN))
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn doy(&self) -> u32 {
        self.0.ordinal()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Modified Julian Day of the calendar day
    pub fn mjd(&self) -> i64 {
        (self.0.date() - epoch(MJD_EPOCH_YMD)).num_days()
    }

    /// Fractional year including the time of day
    pub fn fyear(&self) -> f64 {
        let seconds = self.0.num_seconds_from_midnight() as f64 / SECONDS_PER_DAY as f64;
        self.year() as f64 + ((self.doy() - 1) as f64 + seconds) / days_in_year(self.year()) as f64
    }

    pub fn gps_week(&self) -> i64 {
        (self.0.date() - epoch(GPS_EPOCH_YMD)).num_days().div_euclid(7)
    }

    pub fn gps_week_day(&self) -> u32 {
        (self.0.date() - epoch(GPS_EPOCH_YMD)).num_days().rem_euclid(7) as u32
    }

    /// `2020 045`
    pub fn yyyyddd(&self) -> String {
        format!("{} {:03}", self.year(), self.doy())
    }

    /// `2020/02/14`
    pub fn yyyymmdd(&self) -> String {
        format!("{}/{:02}/{:02}", self.year(), self.month(), self.day())
    }

    /// Station-info text form `YYYY DDD HH MM SS`
    pub fn stninfo_string(&self) -> String {
        format!(
            "{} {:03} {:02} {:02} {:02}",
            self.year(),
            self.doy(),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }

    /// Whole days from `self` to `other` (calendar days, ignoring time of day)
    pub fn days_until(&self, other: &GnssDate) -> i64 {
        other.mjd() - self.mjd()
    }

    /// Seconds from `self` to `other`
    pub fn seconds_until(&self, other: &GnssDate) -> i64 {
        (other.0 - self.0).num_seconds()
    }

    /// Point halfway between two timestamps
    pub fn midpoint(start: &GnssDate, end: &GnssDate) -> GnssDate {
        GnssDate(start.0 + (end.0 - start.0) / 2)
    }
}

impl Add<i64> for GnssDate {
    type Output = GnssDate;

    fn add(self, days: i64) -> GnssDate {
        GnssDate(self.0 + Duration::days(days))
    }
}

impl Sub<i64> for GnssDate {
    type Output = GnssDate;

    fn sub(self, days: i64) -> GnssDate {
        GnssDate(self.0 - Duration::days(days))
    }
}

impl fmt::Display for GnssDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.yyyyddd())
    }
}

// =============================================================================
// Station-Info Text Form
// =============================================================================

/// Render an optional DateEnd, writing the open marker for `None`
pub fn format_stninfo_datetime(date: Option<&GnssDate>) -> String {
    match date {
        Some(date) => date.stninfo_string(),
        None => OPEN_END_TEXT.to_string(),
    }
}

/// Parse `YYYY DDD HH MM SS`; the open marker (`9999 999 ...`) yields `None`
pub fn parse_stninfo_datetime(text: &str) -> Result<Option<GnssDate>> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(Error::date_parsing(format!(
            "Expected 'YYYY DDD HH MM SS', got '{}'",
            text.trim()
        )));
    }

    let mut numbers = [0i64; 5];
    for (slot, field) in numbers.iter_mut().zip(&fields) {
        *slot = field
            .parse()
            .map_err(|_| Error::date_parsing(format!("Non-numeric date field '{}'", field)))?;
    }

    if numbers[0] == OPEN_END_YEAR as i64 || numbers[1] == 999 {
        return Ok(None);
    }

    let day = GnssDate::from_year_doy(numbers[0] as i32, numbers[1] as u32)?;
    day.at_time(numbers[2] as u32, numbers[3] as u32, numbers[4] as u32)
        .map(Some)
}

// =============================================================================
// Date Ranges and Command-Line Date Filters
// =============================================================================

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: GnssDate,
    pub end: GnssDate,
}

impl DateRange {
    /// Build a range, truncating both ends to whole days
    pub fn new(start: GnssDate, end: GnssDate) -> Result<Self> {
        let range = Self {
            start: start.start_of_day(),
            end: end.start_of_day(),
        };
        if range.start > range.end {
            return Err(Error::validation(format!(
                "Date range start {} is after its end {}",
                range.start, range.end
            )));
        }
        Ok(range)
    }

    /// Range covering everything from 1980 day 001 until today
    pub fn everything() -> Self {
        Self {
            start: GnssDate::from_year_doy(DEFAULT_START_YEAR, DEFAULT_START_DOY)
                .unwrap_or_else(|_| GnssDate::from_mjd(0)),
            end: GnssDate::today(),
        }
    }

    /// True when the calendar day of `date` lies inside the range
    pub fn contains_day(&self, date: &GnssDate) -> bool {
        let mjd = date.mjd();
        mjd >= self.start.mjd() && mjd <= self.end.mjd()
    }

    /// MJD bounds (inclusive)
    pub fn mjd_bounds(&self) -> (i64, i64) {
        (self.start.mjd(), self.end.mjd())
    }

    pub fn day_count(&self) -> i64 {
        self.start.days_until(&self.end) + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}

/// Decode one date-filter token
///
/// Accepted forms: fractional year (`2020.5`), `yyyy_ddd`, `yyyy/mm/dd`,
/// `wwww-d` (GPS week and week-day) and, for the first token only, a bare
/// integer `N` meaning N days before `today`.
pub fn parse_date_token(token: &str, position: usize, today: GnssDate) -> Result<GnssDate> {
    let token = token.trim();
    let invalid = |detail: &str| {
        Error::date_parsing(format!(
            "Could not decode input date '{}' (valid entries: fyear, yyyy_ddd, yyyy/mm/dd, \
             gpswk-wkday): {}",
            token, detail
        ))
    };
    let number = |text: &str| -> Result<i64> {
        text.trim()
            .parse::<i64>()
            .map_err(|_| invalid("non-numeric component"))
    };

    if token.contains('.') {
        let fyear: f64 = token.parse().map_err(|_| invalid("bad fractional year"))?;
        GnssDate::from_fyear(fyear)
    } else if let Some((year, doy)) = token.split_once('_') {
        GnssDate::from_year_doy(number(year)? as i32, number(doy)? as u32)
    } else if token.contains('/') {
        let parts: Vec<&str> = token.split('/').collect();
        if parts.len() != 3 {
            return Err(invalid("expected yyyy/mm/dd"));
        }
        GnssDate::from_ymd(
            number(parts[0])? as i32,
            number(parts[1])? as u32,
            number(parts[2])? as u32,
        )
    } else if let Some((week, day)) = token.split_once('-') {
        GnssDate::from_gps_week(number(week)?, number(day)? as u32)
    } else if !token.is_empty() && position == 0 {
        today.checked_sub_days(number(token)?)
    } else {
        Err(invalid("a day count is only accepted as the first date"))
    }
}

/// Decode up to two date-filter tokens into a range
///
/// Missing tokens default to 1980 day 001 and today.
pub fn parse_date_filter(tokens: &[String]) -> Result<DateRange> {
    if tokens.len() > 2 {
        return Err(Error::date_parsing(format!(
            "At most two dates can be given, got {}",
            tokens.len()
        )));
    }

    let today = GnssDate::today();
    let mut range = DateRange::everything();
    for (position, token) in tokens.iter().enumerate() {
        let date = parse_date_token(token, position, today)?;
        if position == 0 {
            range.start = date;
        } else {
            range.end = date;
        }
    }
    DateRange::new(range.start, range.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_representations_agree() {
        let date = GnssDate::from_year_doy(2020, 45).unwrap();
        assert_eq!(date, GnssDate::from_ymd(2020, 2, 14).unwrap());
        assert_eq!(date.yyyyddd(), "2020 045");
        assert_eq!(date.yyyymmdd(), "2020/02/14");
        assert_eq!(GnssDate::from_mjd(date.mjd()), date);
        assert_eq!(
            GnssDate::from_gps_week(date.gps_week(), date.gps_week_day()).unwrap(),
            date
        );
    }

    #[test]
    fn test_out_of_range_tokens_are_errors() {
        let err = parse_date_filter(&["99999999-0".to_string()]).unwrap_err();
        assert!(matches!(err, Error::DateParsing { .. }));
        let err = parse_date_filter(&["999999999".to_string()]).unwrap_err();
        assert!(matches!(err, Error::DateParsing { .. }));
        assert!(GnssDate::from_gps_week(i64::MAX, 0).is_err());

        let today = GnssDate::from_year_doy(2020, 10).unwrap();
        assert_eq!(
            parse_date_token("9", 0, today).unwrap(),
            GnssDate::from_year_doy(2020, 1).unwrap()
        );
    }

    #[test]
    fn test_known_epochs() {
        let gps_origin = GnssDate::from_ymd(1980, 1, 6).unwrap();
        assert_eq!(gps_origin.gps_week(), 0);
        assert_eq!(gps_origin.gps_week_day(), 0);
        assert_eq!(GnssDate::from_ymd(2000, 1, 1).unwrap().mjd(), 51544);
    }

    #[test]
    fn test_fyear_round_trip_keeps_day() {
        let date = GnssDate::from_year_doy(2021, 200).unwrap();
        let back = GnssDate::from_fyear(date.fyear()).unwrap();
        assert_eq!(back.start_of_day(), date);
        assert_eq!(GnssDate::from_fyear(2020.0).unwrap().doy(), 1);
    }

    #[test]
    fn test_sub_day_ordering() {
        let day = GnssDate::from_year_doy(2020, 10).unwrap();
        let noon = day.at_time(12, 0, 0).unwrap();
        assert!(day < noon);
        assert_eq!(day.mjd(), noon.mjd());
        assert_eq!(day.seconds_until(&noon), 43_200);
        assert_eq!(GnssDate::midpoint(&day, &(day + 1)), noon);
    }

    #[test]
    fn test_stninfo_text_form() {
        let date = GnssDate::from_year_doy(2019, 7)
            .unwrap()
            .at_time(3, 4, 5)
            .unwrap();
        assert_eq!(date.stninfo_string(), "2019 007 03 04 05");
        assert_eq!(parse_stninfo_datetime("2019 007 03 04 05").unwrap(), Some(date));
        assert_eq!(parse_stninfo_datetime(OPEN_END_TEXT).unwrap(), None);
        assert_eq!(format_stninfo_datetime(None), OPEN_END_TEXT);
        assert!(parse_stninfo_datetime("2019 007").is_err());
    }

    #[test]
    fn test_date_filter_formats() {
        let today = GnssDate::today();
        let expected = GnssDate::from_year_doy(2020, 45).unwrap();
        assert_eq!(parse_date_token("2020_045", 0, today).unwrap(), expected);
        assert_eq!(parse_date_token("2020/02/14", 0, today).unwrap(), expected);
        let week = format!("{}-{}", expected.gps_week(), expected.gps_week_day());
        assert_eq!(parse_date_token(&week, 1, today).unwrap(), expected);
        assert_eq!(parse_date_token("10", 0, today).unwrap(), today - 10);
        assert!(parse_date_token("10", 1, today).is_err());
        assert!(parse_date_token("2020_abc", 0, today).is_err());
    }

    #[test]
    fn test_date_filter_defaults() {
        let range = parse_date_filter(&[]).unwrap();
        assert_eq!(range.start.yyyyddd(), "1980 001");
        assert_eq!(range.end, GnssDate::today());

        let tokens = vec!["2020_001".to_string(), "2020_010".to_string()];
        let range = parse_date_filter(&tokens).unwrap();
        assert_eq!(range.day_count(), 10);

        let reversed = vec!["2020_010".to_string(), "2020_001".to_string()];
        assert!(parse_date_filter(&reversed).is_err());
    }
}
