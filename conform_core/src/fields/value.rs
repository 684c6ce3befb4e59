use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata of an uploaded file as reported by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub name: String,
    #[serde(alias = "type", alias = "mime")]
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
}

/// A submitted value after coercion to the type its field declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Date(NaiveDate),
    Text(String),
    List(Vec<String>),
    File(FileUpload),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::File(f) => serde_json::to_value(f).unwrap_or(Value::Null),
        }
    }

    /// Plain-text rendering used for `${key}` endpoint substitution and
    /// read-only comparisons against `defaultValue`.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::List(items) => items.join(","),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::File(f) => f.name.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A submission that passed validation, keyed by field `key`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ValidatedConfig {
    values: BTreeMap<String, FieldValue>,
}

impl ValidatedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Unmasked JSON object. Use [`super::read_back`] for anything shown to users.
    pub fn to_json(&self) -> serde_json::Map<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl FromIterator<(String, FieldValue)> for ValidatedConfig {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_rendering() {
        assert_eq!(FieldValue::Bool(true).as_text(), "true");
        assert_eq!(
            FieldValue::List(vec!["a".into(), "b".into()]).as_text(),
            "a,b"
        );
        let date = NaiveDate::from_ymd_opt(2025, 10, 29).unwrap();
        assert_eq!(FieldValue::Date(date).as_text(), "2025-10-29");
    }

    #[test]
    fn test_stored_config_reloads_with_types() {
        let stored = json!({
            "subdomain": "mycompany",
            "sandbox": false,
            "scopes": ["api", "refresh_token"],
            "startDate": "2025-11-02",
            "cert": {"name": "cert.pem", "mimeType": "application/x-pem-file", "size": 1200}
        });
        let config: ValidatedConfig = serde_json::from_value(stored).unwrap();

        assert_eq!(
            config.get("subdomain"),
            Some(&FieldValue::Text("mycompany".into()))
        );
        assert_eq!(config.get("sandbox"), Some(&FieldValue::Bool(false)));
        assert_eq!(
            config.get("startDate"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2025, 11, 2).unwrap()))
        );
        assert!(matches!(config.get("cert"), Some(FieldValue::File(_))));
        assert_eq!(config.len(), 5);
    }
}
