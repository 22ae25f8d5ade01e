//! Bulk Data Insertion export format.
//!
//! Each enriched audit record becomes one fixed-schema CSV row. Building is
//! all-or-nothing: a record missing a required field fails the whole export
//! rather than silently dropping rows.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::models::AuditRecord;

/// Column order required by the bulk ingestion endpoint
pub const EXPORT_HEADER: [&str; 13] = [
    "reportSuiteID",
    "Timestamp",
    "marketingCloudVisitorID",
    "pageName",
    "userAgent",
    "eVar1",
    "eVar2",
    "eVar3",
    "eVar4",
    "eVar5",
    "eVar6",
    "eVar7",
    "events",
];

/// The ingestion endpoint requires a user agent column; audit logs have none.
pub const FILLER_USER_AGENT: &str = "filler_user_agent";

/// Visitor id for records whose login is null or absent
pub const UNKNOWN_VISITOR: &str = "unknown";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("record {index} is missing required field `{field}`")]
    MissingField { field: &'static str, index: usize },

    #[error("record {index} has unparseable dateCreated `{value}`: {source}")]
    BadTimestamp {
        index: usize,
        value: String,
        source: chrono::ParseError,
    },

    #[error("multiple report suite ids in one export: `{first}` and `{second}`")]
    MultipleReportSuites { first: String, second: String },

    #[error("export contains no data rows")]
    EmptyExport,

    #[error("export row {index} is malformed: {reason}")]
    MalformedRow { index: usize, reason: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One row of the 13-column export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub report_suite_id: String,
    pub timestamp: i64,
    pub visitor_id: String,
    pub page_name: String,
    pub user_agent: String,
    pub evar1: String,
    pub evar2: String,
    pub evar3: String,
    pub evar4: String,
    pub evar5: String,
    pub evar6: String,
    pub evar7: String,
    pub events: String,
}

impl ExportRow {
    pub fn from_record(record: &AuditRecord, rsid: &str, index: usize) -> Result<Self, ExportError> {
        let missing = |field: &'static str| ExportError::MissingField { field, index };

        let event_type = record.event_type.as_deref().ok_or(missing("eventType"))?;
        let description = record
            .event_description
            .as_deref()
            .ok_or(missing("eventDescription"))?;
        let date_created = record.date_created.as_deref().ok_or(missing("dateCreated"))?;
        let tag = record.event.as_deref().ok_or(missing("event"))?;

        let timestamp = parse_epoch(date_created).map_err(|source| ExportError::BadTimestamp {
            index,
            value: date_created.to_string(),
            source,
        })?;

        // pageName and eVar2 both carry the event type and description joined
        // by a semicolon
        let composite = format!("{event_type};{description}");

        let (visitor_id, login_evar) = match record.login.as_deref() {
            Some(login) => (
                login.split('@').next().unwrap_or(login).to_string(),
                login.to_string(),
            ),
            None => (UNKNOWN_VISITOR.to_string(), String::new()),
        };

        Ok(Self {
            report_suite_id: rsid.to_string(),
            timestamp,
            visitor_id,
            page_name: composite.clone(),
            user_agent: FILLER_USER_AGENT.to_string(),
            evar1: login_evar,
            evar2: composite,
            evar3: event_type.to_string(),
            evar4: description.to_string(),
            evar5: record.component_id.clone().unwrap_or_default(),
            evar6: record.component_name.clone().unwrap_or_default(),
            evar7: record.component_owner.clone().unwrap_or_default(),
            events: tag.to_string(),
        })
    }

    fn fields(&self) -> [String; 13] {
        [
            self.report_suite_id.clone(),
            self.timestamp.to_string(),
            self.visitor_id.clone(),
            self.page_name.clone(),
            self.user_agent.clone(),
            self.evar1.clone(),
            self.evar2.clone(),
            self.evar3.clone(),
            self.evar4.clone(),
            self.evar5.clone(),
            self.evar6.clone(),
            self.evar7.clone(),
            self.events.clone(),
        ]
    }
}

/// Seconds since epoch from an ISO-8601 creation timestamp. Offset-less
/// values are read as UTC.
fn parse_epoch(value: &str) -> Result<i64, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.and_utc().timestamp())
}

/// Project every record into an export row, or fail on the first record that
/// cannot be represented.
pub fn build_rows(records: &[AuditRecord], rsid: &str) -> Result<Vec<ExportRow>, ExportError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| ExportRow::from_record(record, rsid, index))
        .collect()
}

pub fn write_csv(rows: &[ExportRow], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(EXPORT_HEADER)?;
    for row in rows {
        writer.write_record(&row.fields())?;
    }
    writer.flush()?;
    Ok(())
}

/// Report suite id and calendar date bounds recovered from a written export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub rsid: String,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
}

/// Read an export back out, checking that a single report suite id covers
/// every row and computing the inclusive date bounds of its timestamps.
pub fn read_summary(path: &Path) -> Result<ExportSummary, ExportError> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut rsid: Option<String> = None;
    let mut min_date: Option<NaiveDate> = None;
    let mut max_date: Option<NaiveDate> = None;

    for (index, result) in reader.records().enumerate() {
        let row = result?;
        let row_rsid = row.get(0).ok_or_else(|| ExportError::MalformedRow {
            index,
            reason: "missing report suite id column".to_string(),
        })?;
        match &rsid {
            None => rsid = Some(row_rsid.to_string()),
            Some(first) if first != row_rsid => {
                return Err(ExportError::MultipleReportSuites {
                    first: first.clone(),
                    second: row_rsid.to_string(),
                });
            }
            Some(_) => {}
        }

        let raw_timestamp = row.get(1).ok_or_else(|| ExportError::MalformedRow {
            index,
            reason: "missing timestamp column".to_string(),
        })?;
        let timestamp: i64 = raw_timestamp.parse().map_err(|_| ExportError::MalformedRow {
            index,
            reason: format!("non-numeric timestamp `{raw_timestamp}`"),
        })?;
        let date = DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| ExportError::MalformedRow {
                index,
                reason: format!("timestamp `{timestamp}` out of range"),
            })?
            .date_naive();

        min_date = Some(min_date.map_or(date, |current| current.min(date)));
        max_date = Some(max_date.map_or(date, |current| current.max(date)));
    }

    match (rsid, min_date, max_date) {
        (Some(rsid), Some(min_date), Some(max_date)) => Ok(ExportSummary {
            rsid,
            min_date,
            max_date,
        }),
        _ => Err(ExportError::EmptyExport),
    }
}
