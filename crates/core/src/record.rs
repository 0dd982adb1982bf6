use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::error::RecordError;

/// Ordered field map; keeps the key order of the source object.
pub type Fields = IndexMap<String, FieldValue>;

/// Typed field values. Nested sub-records (kill-chain phases, external
/// references) arrive as `List` of `Object`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
    Object(Fields),
}

impl FieldValue {
    /// Extract as string, returning None for anything but `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            FieldValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// One step of a dotted path. Objects yield their member; lists yield
    /// the member of every object element.
    fn child<'a>(&'a self, key: &str) -> Vec<&'a FieldValue> {
        match self {
            FieldValue::Object(fields) => fields.get(key).into_iter().collect(),
            FieldValue::List(items) => items
                .iter()
                .filter_map(|item| item.as_object().and_then(|o| o.get(key)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                FieldValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

/// An immutable typed knowledge-base entity.
///
/// `id` and `type` are validated at construction and cached; they also stay
/// in `fields` so predicates can address them like any other field and the
/// record serializes back to its original shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    record_type: String,
    fields: Fields,
}

impl Record {
    /// Build a record from an already-typed field map.
    pub fn new(fields: Fields) -> Result<Self, RecordError> {
        let id = required_text(&fields, "id")?;
        let record_type = required_text(&fields, "type")?;
        Ok(Self {
            id,
            record_type,
            fields,
        })
    }

    /// Build a record from one raw JSON object of a bundle.
    pub fn from_json(value: serde_json::Value) -> Result<Self, RecordError> {
        match FieldValue::from(value) {
            FieldValue::Object(fields) => Self::new(fields),
            other => Err(RecordError::NotAnObject(kind_name(&other))),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text value of a top-level field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }

    /// Parsed `modified` timestamp, if present and well-formed.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.text("modified")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Walk a dotted path (`kill_chain_phases.phase_name`).
    ///
    /// Every list met on the way fans out, so the result holds one entry per
    /// reachable leaf. An absent segment yields nothing.
    pub fn resolve(&self, path: &str) -> Vec<&FieldValue> {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return Vec::new();
        };
        let mut current: Vec<&FieldValue> = self.fields.get(first).into_iter().collect();
        for segment in segments {
            current = current.into_iter().flat_map(|v| v.child(segment)).collect();
        }
        current
    }

    /// `kill_chain_phases` flattened into typed pairs.
    pub fn kill_chain_phases(&self) -> Vec<KillChainPhase> {
        self.field("kill_chain_phases")
            .and_then(FieldValue::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| {
                let entry = entry.as_object()?;
                Some(KillChainPhase {
                    kill_chain_name: entry.get("kill_chain_name")?.as_str()?.to_string(),
                    phase_name: entry.get("phase_name")?.as_str()?.to_string(),
                })
            })
            .collect()
    }

    /// All `external_id` values from `external_references`, in order.
    pub fn external_ids(&self) -> Vec<&str> {
        self.resolve("external_references.external_id")
            .into_iter()
            .filter_map(FieldValue::as_str)
            .collect()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// One `{kill_chain_name, phase_name}` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KillChainPhase {
    pub kill_chain_name: String,
    pub phase_name: String,
}

fn required_text(fields: &Fields, key: &'static str) -> Result<String, RecordError> {
    match fields.get(key).and_then(FieldValue::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(RecordError::MissingKey(key)),
    }
}

fn kind_name(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Null => "null",
        FieldValue::Boolean(_) => "boolean",
        FieldValue::Integer(_) | FieldValue::Float(_) => "number",
        FieldValue::Text(_) => "string",
        FieldValue::List(_) => "array",
        FieldValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn technique() -> Record {
        Record::from_json(json!({
            "type": "attack-pattern",
            "id": "attack-pattern--0001",
            "name": "Phishing",
            "modified": "2024-04-16T12:00:00.000Z",
            "kill_chain_phases": [
                {"kill_chain_name": "mitre-attack", "phase_name": "initial-access"},
                {"kill_chain_name": "other", "phase_name": "execution"}
            ],
            "external_references": [
                {"source_name": "mitre-attack", "external_id": "T1566"},
                {"source_name": "capec", "external_id": "CAPEC-98"},
                {"source_name": "blog", "url": "https://example.com"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn from_json_requires_id_and_type() {
        let err = Record::from_json(json!({"type": "tool"})).unwrap_err();
        assert_eq!(err, RecordError::MissingKey("id"));

        let err = Record::from_json(json!({"id": "tool--1", "type": ""})).unwrap_err();
        assert_eq!(err, RecordError::MissingKey("type"));

        let err = Record::from_json(json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err, RecordError::NotAnObject("array"));
    }

    #[test]
    fn resolve_walks_lists_of_objects() {
        let record = technique();
        let phases: Vec<_> = record
            .resolve("kill_chain_phases.phase_name")
            .into_iter()
            .filter_map(FieldValue::as_str)
            .collect();
        assert_eq!(phases, vec!["initial-access", "execution"]);
    }

    #[test]
    fn resolve_missing_path_is_empty() {
        let record = technique();
        assert!(record.resolve("x_mitre_platforms").is_empty());
        assert!(record.resolve("kill_chain_phases.nope").is_empty());
        assert!(record.resolve("name.deeper").is_empty());
    }

    #[test]
    fn external_ids_skip_entries_without_one() {
        assert_eq!(technique().external_ids(), vec!["T1566", "CAPEC-98"]);
    }

    #[test]
    fn kill_chain_phases_are_typed() {
        let phases = technique().kill_chain_phases();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].kill_chain_name, "mitre-attack");
        assert_eq!(phases[0].phase_name, "initial-access");
    }

    #[test]
    fn serializes_back_with_source_key_order() {
        let record = technique();
        let out = serde_json::to_string(&record).unwrap();
        assert!(out.starts_with(r#"{"type":"attack-pattern","id":"attack-pattern--0001""#));
    }

    #[test]
    fn modified_parses_rfc3339() {
        let modified = technique().modified().unwrap();
        assert_eq!(modified.to_rfc3339(), "2024-04-16T12:00:00+00:00");
    }
}
