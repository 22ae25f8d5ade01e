use std::collections::HashMap;

use tracing::warn;

use crate::models::AuditRecord;

/// Label for records with no event-type code, and the prefix for codes the
/// table does not know.
pub const UNKNOWN_EVENT_TYPE: &str = "Unknown Event Type";

/// Category codes the audit API emits, per the usage-logs documentation.
const EVENT_TYPES: &[(i64, &str)] = &[
    (0, "No Category"),
    (1, "Login failed"),
    (2, "Login successful"),
    (3, "Admin Action"),
    (4, "Security setting change"),
    (5, "Report viewed"),
    (6, "Report downloaded"),
    (7, "Alert sent"),
    (8, "User Action"),
    (9, "Tool viewed"),
    (10, "Adobe Action"),
    (11, "Password Recovery"),
    (12, "BookMarks"),
    (13, "Dashboards"),
    (14, "Alerts"),
    (15, "Calendar Events"),
    (16, "Targets"),
    (17, "Report Settings"),
    (18, "Scheduled Reports"),
    (19, "Exclude By IP"),
    (20, "Name Pages"),
    (21, "Classifications"),
    (22, "Data Sources"),
    (23, "Workspace Project"),
    (24, "Segment"),
    (25, "Calculated Metric"),
    (26, "Date Range"),
    (27, "Virtual Report Suite"),
    (28, "Contribution Analysis"),
    (30, "Excel Data Block Request"),
    (31, "Excel Login Failure"),
    (32, "Excel Login Success"),
    (41, "Mobile Login Failure"),
    (42, "Mobile Login Success"),
    (61, "Api Method"),
];

/// Lookup table from numeric event-type code to a human-readable label.
pub struct EventTypeTable {
    entries: HashMap<i64, String>,
}

impl Default for EventTypeTable {
    fn default() -> Self {
        Self::from_entries(EVENT_TYPES.iter().map(|&(code, label)| (code, label)))
    }
}

impl EventTypeTable {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (i64, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(code, label)| (code, label.to_string()))
                .collect(),
        }
    }

    pub fn label(&self, code: i64) -> Option<&str> {
        self.entries.get(&code).map(String::as_str)
    }

    /// Rewrite each record's event-type code into its label.
    ///
    /// Missing codes become [`UNKNOWN_EVENT_TYPE`]; codes outside the table
    /// keep the numeric value in the label. A non-numeric code is logged and
    /// the record left unchanged; the rest of the batch continues.
    pub fn apply(&self, records: &mut [AuditRecord]) {
        for (index, record) in records.iter_mut().enumerate() {
            let raw = match record.event_type.as_deref() {
                None => {
                    record.event_type = Some(UNKNOWN_EVENT_TYPE.to_string());
                    continue;
                }
                Some(raw) => raw,
            };
            match raw.trim().parse::<i64>() {
                Ok(code) => {
                    let label = match self.label(code) {
                        Some(label) => label.to_string(),
                        None => format!("{UNKNOWN_EVENT_TYPE}: {code}"),
                    };
                    record.event_type = Some(label);
                }
                Err(error) => {
                    warn!(index, code = raw, %error, "non-numeric event type, record left unchanged");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_code(code: serde_json::Value) -> AuditRecord {
        serde_json::from_value(serde_json::json!({ "eventType": code })).unwrap()
    }

    #[test]
    fn test_known_codes_decode_to_labels() {
        let table = EventTypeTable::default();
        let mut records = vec![
            record_with_code("0".into()),
            record_with_code("1".into()),
            record_with_code("61".into()),
        ];
        table.apply(&mut records);
        assert_eq!(records[0].event_type.as_deref(), Some("No Category"));
        assert_eq!(records[1].event_type.as_deref(), Some("Login failed"));
        assert_eq!(records[2].event_type.as_deref(), Some("Api Method"));
    }

    #[test]
    fn test_integer_code_decodes() {
        let table = EventTypeTable::default();
        let mut records = vec![record_with_code(1.into()), record_with_code(2.into())];
        table.apply(&mut records);
        assert_eq!(records[0].event_type.as_deref(), Some("Login failed"));
        assert_eq!(records[1].event_type.as_deref(), Some("Login successful"));
    }

    #[test]
    fn test_unrecognized_code_keeps_number_in_label() {
        let table = EventTypeTable::default();
        let mut records = vec![record_with_code("9999".into())];
        table.apply(&mut records);
        assert_eq!(
            records[0].event_type.as_deref(),
            Some("Unknown Event Type: 9999")
        );
    }

    #[test]
    fn test_missing_code_gets_sentinel_label() {
        let table = EventTypeTable::default();
        let mut records = vec![AuditRecord::default()];
        table.apply(&mut records);
        assert_eq!(records[0].event_type.as_deref(), Some("Unknown Event Type"));
    }

    #[test]
    fn test_non_numeric_code_left_unchanged() {
        let table = EventTypeTable::default();
        let mut records = vec![record_with_code("already decoded".into())];
        table.apply(&mut records);
        assert_eq!(records[0].event_type.as_deref(), Some("already decoded"));
    }

    #[test]
    fn test_custom_table_substitution() {
        let table = EventTypeTable::from_entries([(7, "Seven")]);
        let mut records = vec![record_with_code("7".into())];
        table.apply(&mut records);
        assert_eq!(records[0].event_type.as_deref(), Some("Seven"));
    }
}
