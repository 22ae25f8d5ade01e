use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One usage/admin audit-log entry.
///
/// Only the fields the pipeline touches are typed; everything else the server
/// sends is carried through `extra` so saved artifacts keep the full record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Numeric category code as fetched; rewritten to a human-readable label
    /// by the enrichment pass. The server sends it as a string or an integer.
    #[serde(
        rename = "eventType",
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_type: Option<String>,

    #[serde(rename = "eventDescription", default)]
    pub event_description: Option<String>,

    #[serde(default)]
    pub login: Option<String>,

    #[serde(rename = "dateCreated", default)]
    pub date_created: Option<String>,

    #[serde(rename = "componentName", default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,

    #[serde(rename = "componentId", default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,

    #[serde(rename = "componentOwner", default, skip_serializing_if = "Option::is_none")]
    pub component_owner: Option<String>,

    /// Derived tag code assigned by the event-tagging pass (empty when no
    /// phrase matched; absent until the pass has run)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}
