//! Normalized drive-test record.
//!
//! A [`Record`] is one decoded signaling or measurement row as produced by
//! the upstream log decoders. Only a handful of fields are typed; everything
//! else stays in two string-keyed maps (`properties` and the record's own
//! direct fields) because exporters disagree on naming.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// String-keyed bag of loosely typed values.
pub type Properties = BTreeMap<String, Value>;

/// Record type tag for radio measurement rows.
pub const MEASUREMENT_TYPE: &str = "MEASUREMENT";

/// One normalized input record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record time, ISO-8601 or `HH:MM:SS[.mmm]`
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Record kind, e.g. `MEASUREMENT` or `SIGNALING`
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_type: Option<String>,
    /// Event name
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Decoded message name or text
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Free-text details
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// RRC release cause
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub rrc_rel_cause: Option<String>,
    /// CS release cause
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub cs_rel_cause: Option<String>,
    /// Decoder-specific properties (`Message`, `RRC State`, `RSCP`, ...)
    #[serde(
        default,
        deserialize_with = "lenient_properties",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub properties: Properties,
    /// Any other direct field on the record (`callId`, `imsi`, `level`, ...)
    #[serde(flatten)]
    pub fields: Properties,
}

/// Renders a scalar JSON value as text; empty strings, nulls and containers
/// have no text.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a finite number from a JSON number or a numeric string.
pub fn value_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_text))
}

/// `null` or a non-object `properties` value reads as an empty map.
fn lenient_properties<'de, D>(deserializer: D) -> Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Ok(map.into_iter().collect()),
        _ => Ok(Properties::new()),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Record {
    /// Creates an empty record at the given time.
    pub fn at(time: impl Into<String>) -> Self {
        Self {
            time: Some(time.into()),
            ..Self::default()
        }
    }

    /// Sets the message text.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the event name.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Sets the details text.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Sets the record type.
    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Sets the RRC release cause.
    pub fn with_rrc_cause(mut self, cause: impl Into<String>) -> Self {
        self.rrc_rel_cause = Some(cause.into());
        self
    }

    /// Sets the CS release cause.
    pub fn with_cs_cause(mut self, cause: impl Into<String>) -> Self {
        self.cs_rel_cause = Some(cause.into());
        self
    }

    /// Adds a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Adds a direct field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Raw time text, empty when absent.
    pub fn time_text(&self) -> &str {
        self.time.as_deref().unwrap_or("")
    }

    /// Non-empty event text.
    pub fn event_text(&self) -> Option<&str> {
        non_empty(&self.event)
    }

    /// Non-empty message text.
    pub fn message_text(&self) -> Option<&str> {
        non_empty(&self.message)
    }

    /// Non-empty details text.
    pub fn details_text(&self) -> Option<&str> {
        non_empty(&self.details)
    }

    /// Text of a property, by exact key.
    pub fn property_text(&self, key: &str) -> Option<String> {
        self.properties.get(key).and_then(value_text)
    }

    /// Text of a direct field, by exact key.
    pub fn field_text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(value_text)
    }

    /// Numeric property, by exact key.
    pub fn property_number(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(value_number)
    }

    /// Numeric direct field, by exact key.
    pub fn field_number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(value_number)
    }

    /// Whether the record is a radio measurement row.
    pub fn is_measurement(&self) -> bool {
        self.record_type.as_deref() == Some(MEASUREMENT_TYPE)
    }
}
