//! Inclusive date windows for audit-log queries.
//!
//! The audit-log endpoint rejects ranges longer than 89 days, so an overall
//! range is split into consecutive calendar windows before fetching.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Longest span (in days between first and last date) the audit-log endpoint
/// accepts in a single query.
pub const MAX_WINDOW_DAYS: i64 = 89;

/// Date format accepted on the command line
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Datetime format the analytics API expects in query parameters
const API_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid date: {0}")]
    Parse(#[from] chrono::ParseError),

    #[error("date {0} is out of range")]
    OutOfRange(NaiveDate),
}

/// Inclusive [start, end] pair bounding one audit-log query.
///
/// The end is midnight of the day after the last calendar day, minus one
/// second, so the final day's records are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    pub fn inclusive(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::InvalidRange { start, end });
        }
        let end_dt = end
            .and_time(NaiveTime::MIN)
            .checked_add_signed(Duration::days(1))
            .and_then(|dt| dt.checked_sub_signed(Duration::seconds(1)))
            .ok_or(WindowError::OutOfRange(end))?;
        Ok(Self {
            start: start.and_time(NaiveTime::MIN),
            end: end_dt,
        })
    }

    /// `startDate` query parameter value
    pub fn start_param(&self) -> String {
        self.start.format(API_DATETIME_FORMAT).to_string()
    }

    /// `endDate` query parameter value
    pub fn end_param(&self) -> String {
        self.end.format(API_DATETIME_FORMAT).to_string()
    }

    /// `dateRange` filter value for the reporting API
    pub fn date_range_param(&self) -> String {
        format!("{}/{}", self.start_param(), self.end_param())
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, WindowError> {
    Ok(NaiveDate::parse_from_str(value, DATE_FORMAT)?)
}

/// Split an overall inclusive date range into consecutive windows of at most
/// [`MAX_WINDOW_DAYS`], the last window possibly shorter. A single-day range
/// produces exactly one window.
pub fn split_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<DateWindow>, WindowError> {
    if start > end {
        return Err(WindowError::InvalidRange { start, end });
    }

    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let chunk_end = cursor
            .checked_add_signed(Duration::days(MAX_WINDOW_DAYS))
            .map_or(end, |limit| limit.min(end));
        windows.push(DateWindow::inclusive(cursor, chunk_end)?);
        cursor = match chunk_end.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    Ok(windows)
}
