use crate::error::Result;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Raw record as returned from the upstream API or the raw events file
pub type RawRecord = Value;

/// Coordinate pair as found in the source, either side possibly missing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLatLon {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// Typed view over one upstream record. Every field is optional; decoding is
/// lenient so that the normalizer only ever sees absent or textual values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_start: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_end: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address_street: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address_zipcode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address_city: Option<String>,
    #[serde(default, deserialize_with = "lenient_lat_lon")]
    pub lat_lon: Option<RawLatLon>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Option<Vec<Option<String>>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub program: Option<Vec<Option<String>>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub event_type: Option<Vec<Option<String>>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub access_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price_detail: Option<String>,
}

impl RawEvent {
    /// Decode a raw record. Only a record that is not a field mapping is
    /// rejected; malformed fields fall back to `None`.
    pub fn from_record(record: &RawRecord) -> std::result::Result<Self, String> {
        if !record.is_object() {
            return Err(format!("expected a JSON object, found {}", value_kind(record)));
        }
        RawEvent::deserialize(record).map_err(|e| e.to_string())
    }
}

/// Core trait that every raw record source implements
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    /// Short identifier used in logs and metrics labels
    fn source_name(&self) -> &'static str;

    /// Fetch every record this source currently holds, in source order
    async fn fetch_records(&self) -> Result<Vec<RawRecord>>;
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Text form of a JSON scalar; `null` is absent, containers keep their JSON text.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_text))
}

fn lenient_list<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<Option<String>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(items.iter().map(scalar_text).collect()),
        _ => None,
    })
}

fn lenient_lat_lon<'de, D>(deserializer: D) -> std::result::Result<Option<RawLatLon>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(RawLatLon {
            lat: items.first().and_then(scalar_text),
            lon: items.get(1).and_then(scalar_text),
        }),
        Some(Value::Object(map)) => Some(RawLatLon {
            lat: map.get("lat").and_then(scalar_text),
            lon: map.get("lon").and_then(scalar_text),
        }),
        _ => None,
    })
}
