//! The lenient incoming record shape.
//!
//! Engines are sloppy about JSON types: quantities arrive as `"2"`, phone
//! numbers as bare integers. Every field is kept as an optional string and
//! typed later by [`crate::merge`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sg_domain::record::IntakeRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub item_description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub preferred_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time_slot: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub pickup_location: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub notes: Option<String>,
}

impl RecordPatch {
    /// Parse a JSON value, yielding `None` when it is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// True when no field carries a non-blank value.
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|v| blank(v))
    }

    /// Number of fields carrying a non-blank value.
    pub fn filled(&self) -> usize {
        self.values().iter().filter(|v| !blank(v)).count()
    }

    fn values(&self) -> [&Option<String>; 9] {
        [
            &self.name,
            &self.address,
            &self.phone,
            &self.item_description,
            &self.quantity,
            &self.preferred_date,
            &self.time_slot,
            &self.pickup_location,
            &self.notes,
        ]
    }
}

impl From<&IntakeRecord> for RecordPatch {
    fn from(r: &IntakeRecord) -> Self {
        Self {
            name: r.name.clone(),
            address: r.address.clone(),
            phone: r.phone.clone(),
            item_description: r.item_description.clone(),
            quantity: r.quantity.map(|q| q.to_string()),
            preferred_date: r.preferred_date.clone(),
            time_slot: r.time_slot.map(|t| t.as_str().to_string()),
            pickup_location: r.pickup_location.clone(),
            notes: r.notes.clone(),
        }
    }
}

pub(crate) fn blank(v: &Option<String>) -> bool {
    v.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Accept any scalar and stringify it; arrays and objects read as unset.
fn lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_of_any_type_are_stringified() {
        let patch: RecordPatch = serde_json::from_str(
            r#"{"quantity": 2, "phone": 9012345678, "name": "ヤマダ", "notes": null}"#,
        )
        .unwrap();
        assert_eq!(patch.quantity.as_deref(), Some("2"));
        assert_eq!(patch.phone.as_deref(), Some("9012345678"));
        assert_eq!(patch.name.as_deref(), Some("ヤマダ"));
        assert!(patch.notes.is_none());
        assert_eq!(patch.filled(), 3);
    }

    #[test]
    fn nested_values_and_unknown_keys_are_ignored() {
        let patch: RecordPatch =
            serde_json::from_str(r#"{"address": {"city": "大阪"}, "extra": 1}"#).unwrap();
        assert!(patch.address.is_none());
        assert!(patch.is_empty());
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(RecordPatch::from_value(&serde_json::json!("text")).is_none());
        assert!(RecordPatch::from_value(&serde_json::json!({})).is_some());
    }
}
