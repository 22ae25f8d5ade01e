use crate::models::AuditRecord;

/// Tag codes and the description phrases that trigger them, in priority
/// order: the first phrase found in a description wins. Codes line up with
/// the success events configured in the target report suite.
const EVENT_TAGS: &[(&str, &str)] = &[
    ("event1", "project created"),
    ("event2", "project viewed"),
    ("event3", "project updated"),
    ("event4", "project deleted"),
    ("event5", "sharing project"),
    ("event6", "segment created"),
    ("event7", "segment updated"),
    ("event8", "segment deleted"),
    ("event9", "sharing segment"),
    ("event10", "calculated metric created"),
    ("event11", "calculated metric updated"),
    ("event12", "calculated metric deleted"),
    ("event13", "sharing calculated metric"),
    ("event14", "date range created"),
    ("event15", "date range updated"),
    ("event16", "date range deleted"),
    ("event17", "sharing date range"),
    ("event18", "virtual report suite created"),
    ("event19", "virtual report suite updated"),
    ("event20", "virtual report suite deleted"),
    ("event21", "alert created"),
    ("event22", "alert updated"),
    ("event23", "alert deleted"),
    ("event24", "sharing alert"),
    ("event25", "delivered alert"),
    ("event26", "classification"),
    ("event27", "viewed permissions"),
    ("event28", "viewed company"),
    ("event29", "viewed logs"),
    ("event30", "successful login"),
    ("event31", "login failed"),
    ("event32", "api operation"),
];

/// Ordered phrase table assigning a tag code per record.
pub struct EventTagTable {
    entries: Vec<(String, String)>,
}

impl Default for EventTagTable {
    fn default() -> Self {
        Self::from_entries(EVENT_TAGS.iter().map(|&(code, phrase)| (code, phrase)))
    }
}

impl EventTagTable {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(code, phrase)| (code.to_string(), phrase.to_lowercase()))
                .collect(),
        }
    }

    /// Assign each record the tag of the first phrase contained in its
    /// lower-cased description, or an empty tag when none match.
    pub fn apply(&self, records: &mut [AuditRecord]) {
        for record in records.iter_mut() {
            let description = record
                .event_description
                .as_deref()
                .unwrap_or("")
                .to_lowercase();
            let tag = self
                .entries
                .iter()
                .find(|(_, phrase)| description.contains(phrase.as_str()))
                .map(|(code, _)| code.clone())
                .unwrap_or_default();
            record.event = Some(tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(description: &str) -> AuditRecord {
        serde_json::from_value(serde_json::json!({ "eventDescription": description })).unwrap()
    }

    #[test]
    fn test_phrase_assigns_tag() {
        let table = EventTagTable::default();
        let mut records = vec![record("Segment Created: Name=Foo Id=bar")];
        table.apply(&mut records);
        assert_eq!(records[0].event.as_deref(), Some("event6"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let table = EventTagTable::default();
        let mut records = vec![record("API OPERATION performed by admin")];
        table.apply(&mut records);
        assert_eq!(records[0].event.as_deref(), Some("event32"));
    }

    #[test]
    fn test_first_phrase_in_table_order_wins() {
        let table = EventTagTable::default();
        // Contains both "project created" (event1) and "segment created" (event6)
        let mut records = vec![record("Project created after segment created")];
        table.apply(&mut records);
        assert_eq!(records[0].event.as_deref(), Some("event1"));
    }

    #[test]
    fn test_no_phrase_yields_empty_tag() {
        let table = EventTagTable::default();
        let mut records = vec![record("Password reset requested")];
        table.apply(&mut records);
        assert_eq!(records[0].event.as_deref(), Some(""));
    }

    #[test]
    fn test_missing_description_yields_empty_tag() {
        let table = EventTagTable::default();
        let mut records = vec![AuditRecord::default()];
        table.apply(&mut records);
        assert_eq!(records[0].event.as_deref(), Some(""));
    }

    #[test]
    fn test_custom_table_substitution() {
        let table = EventTagTable::from_entries([("eventA", "custom phrase")]);
        let mut records = vec![record("A Custom Phrase appeared")];
        table.apply(&mut records);
        assert_eq!(records[0].event.as_deref(), Some("eventA"));
    }
}
