use regex::Regex;

use crate::models::AuditRecord;

/// Owner value used when a description names no owner
pub const NO_OWNER: &str = "N/A";

/// Capture pattern for component references inside event descriptions, e.g.
/// `Segment Created: Name=Checkout Funnel Id=s123_abc Owner=Jane Smith`.
/// Name and id are mandatory; owner is optional.
const COMPONENT_PATTERN: &str = r"Name=(?P<name>.*?)\sId=(?P<id>\S+)(?:\sOwner=(?P<owner>.*))?";

/// Pulls component name, id, and owner out of free-text descriptions.
pub struct ComponentPattern {
    regex: Regex,
}

impl ComponentPattern {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_pattern(COMPONENT_PATTERN)
    }

    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Set the component fields on every record whose description matches.
    /// Records without a match are left untouched.
    pub fn apply(&self, records: &mut [AuditRecord]) {
        for record in records.iter_mut() {
            let extracted = record
                .event_description
                .as_deref()
                .and_then(|description| self.regex.captures(description))
                .and_then(|caps| {
                    let name = caps.name("name")?.as_str().trim().to_string();
                    let id = caps.name("id")?.as_str().trim().to_string();
                    let owner = caps
                        .name("owner")
                        .map(|m| m.as_str().trim())
                        .filter(|owner| !owner.is_empty())
                        .unwrap_or(NO_OWNER)
                        .to_string();
                    Some((name, id, owner))
                });

            if let Some((name, id, owner)) = extracted {
                record.component_name = Some(name);
                record.component_id = Some(id);
                record.component_owner = Some(owner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(description: &str) -> AuditRecord {
        serde_json::from_value(serde_json::json!({ "eventDescription": description })).unwrap()
    }

    fn components(record: &AuditRecord) -> (Option<&str>, Option<&str>, Option<&str>) {
        (
            record.component_name.as_deref(),
            record.component_id.as_deref(),
            record.component_owner.as_deref(),
        )
    }

    #[test]
    fn test_extracts_name_id_and_owner() {
        let pattern = ComponentPattern::new().unwrap();
        let mut records = vec![record("Name=Foo Bar Id=abc123 Owner=Jane Smith")];
        pattern.apply(&mut records);
        assert_eq!(
            components(&records[0]),
            (Some("Foo Bar"), Some("abc123"), Some("Jane Smith"))
        );
    }

    #[test]
    fn test_missing_owner_defaults_to_sentinel() {
        let pattern = ComponentPattern::new().unwrap();
        let mut records = vec![record(
            "Segment Updated: Name=Product Brand = Celotex OR ISOVER Segment Id=s3954_611b8639bd1b3b1ffc3fdffc",
        )];
        pattern.apply(&mut records);
        assert_eq!(
            components(&records[0]),
            (
                Some("Product Brand = Celotex OR ISOVER Segment"),
                Some("s3954_611b8639bd1b3b1ffc3fdffc"),
                Some(NO_OWNER)
            )
        );
    }

    #[test]
    fn test_real_world_descriptions() {
        let pattern = ComponentPattern::new().unwrap();
        let mut records = vec![
            record(
                "Segment Created: Name=Target Activities = Test 26 - Popular Categories Design V2 - Live Id=s3954_621cd43a89b6ad49703259b5 Owner=Jane Smith",
            ),
            record(
                "Calculated Metric Created: Name=Cash Application Success (e1) Calculated Metric Id=cm3954_621cc07532a5796d562f2909 Owner=John Smith",
            ),
            record(
                "Project Viewed: Name=Accutics QA - Campaign Builder & Cost Importer Project Id=61c0b641e4a6c16bf1763cfe Owner=Steve Webb",
            ),
        ];
        pattern.apply(&mut records);

        assert_eq!(
            components(&records[0]),
            (
                Some("Target Activities = Test 26 - Popular Categories Design V2 - Live"),
                Some("s3954_621cd43a89b6ad49703259b5"),
                Some("Jane Smith")
            )
        );
        assert_eq!(
            components(&records[1]),
            (
                Some("Cash Application Success (e1) Calculated Metric"),
                Some("cm3954_621cc07532a5796d562f2909"),
                Some("John Smith")
            )
        );
        assert_eq!(
            components(&records[2]),
            (
                Some("Accutics QA - Campaign Builder & Cost Importer Project"),
                Some("61c0b641e4a6c16bf1763cfe"),
                Some("Steve Webb")
            )
        );
    }

    #[test]
    fn test_no_match_leaves_record_untouched() {
        let pattern = ComponentPattern::new().unwrap();
        let mut records = vec![record("Login failed for user"), AuditRecord::default()];
        pattern.apply(&mut records);
        for r in &records {
            assert_eq!(components(r), (None, None, None));
        }
    }
}
