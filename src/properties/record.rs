//! Property Record - typed metrics for a single run

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Value;

/// Property Record holds the extracted and derived fields of one run.
///
/// Absent fields are simply not in the map. The JSON representation is a
/// flat object that omits absent keys, so consumers can always tell
/// "not measured" from "measured zero".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyRecord {
    fields: BTreeMap<String, Value>,
}

impl PropertyRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a field as `f64`, if present and numeric.
    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Get a field as `i64`, if present and an integer.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Whether the field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Builder-style variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Number of present fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for PropertyRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_new_is_empty() {
        let record = PropertyRecord::new();
        assert!(record.is_empty());
        assert_eq!(record.len(), 0);
    }

    #[test]
    fn test_record_insert_and_get() {
        let record = PropertyRecord::new()
            .with("evaluations", 40_i64)
            .with("search_time", 0.5);
        assert_eq!(record.get_i64("evaluations"), Some(40));
        assert_eq!(record.get_f64("evaluations"), Some(40.0));
        assert_eq!(record.get_f64("search_time"), Some(0.5));
        assert!(record.get("cost").is_none());
    }

    #[test]
    fn test_absent_fields_are_omitted_in_json() {
        let record = PropertyRecord::new().with("cost", 0_i64);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"cost": 0}));
        assert!(json.get("plan_length").is_none());
    }
}
