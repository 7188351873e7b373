use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::value::{to_raw_value, RawValue};
use serde_json::{Map, Number, Value};

pub const APPLICATION_DATE: &str = "applicationDate";
pub const INSPECTION_DATE: &str = "inspectionDate";

/// Store-assigned report identifier, `RPT-` followed by an at least three digit sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub const PREFIX: &'static str = "RPT-";

    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("{}{:03}", Self::PREFIX, seq))
    }

    /// Numeric suffix of the id; anything that does not parse counts as 0.
    pub fn sequence(&self) -> u64 {
        self.0
            .strip_prefix(Self::PREFIX)
            .and_then(|digits| digits.parse::<u64>().ok())
            .unwrap_or(0)
    }

    /// Id following `max`; `None` once the sequence space is used up.
    pub fn after_sequence(max: u64) -> Option<Self> {
        max.checked_add(1).map(Self::from_sequence)
    }

    /// Highest sequence among `ids`; 0 when there are none.
    pub fn max_sequence<'a, I>(ids: I) -> u64
    where
        I: IntoIterator<Item = &'a ReportId>,
    {
        ids.into_iter().map(ReportId::sequence).max().unwrap_or(0)
    }

    /// Highest `RPT-<digits>` sequence mentioned anywhere in `text`.
    pub fn max_sequence_in(text: &str) -> u64 {
        text.match_indices(Self::PREFIX)
            .filter_map(|(at, prefix)| {
                let rest = &text[at + prefix.len()..];
                let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
                rest[..end].parse::<u64>().ok()
            })
            .max()
            .unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ReportId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ReportId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for ReportId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ReportId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A date as the form submits it: either a text timestamp or epoch milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Millis(i64),
    Text(String),
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

/// Caller-supplied fields, each kept as the exact JSON text it arrived as.
///
/// Only the serde_json deserializer can produce one (raw values need the
/// source text), so build it from a string or via [`Payload::from_value`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, Box<RawValue>>);

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|((ka, va), (kb, vb))| ka == kb && va.get() == vb.get())
    }
}

impl Payload {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&value.to_string())
    }

    /// The JSON text stored under `key`, verbatim.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.get())
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.raw(key).and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// String value of `key`; `None` when absent or not a JSON string.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.value(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), serde_json::Error> {
        self.0.insert(key.to_string(), to_raw_value(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Box<RawValue>> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), &**v))
    }

    /// Typed view of the business fields. Never fails: mistyped values read as empty.
    pub fn fields(&self) -> ReportFields {
        let map: Map<String, Value> = self
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::from_str::<Value>(v.get()).ok().map(|v| (k.clone(), v)))
            .collect();
        serde_json::from_value(Value::Object(map)).unwrap_or_default()
    }
}

/// Tolerant decoders for the typed views: a value of the wrong JSON type reads
/// as empty instead of failing the whole record.
mod lenient {
    use super::*;

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_text(d)?.unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Number>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => Some(n),
            _ => None,
        })
    }

    /// Positions are kept: an element that is not an object becomes an empty commodity.
    pub fn commodities<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Commodity>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        })
    }
}

/// One inspected/certified commodity line, as read from a report.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commodity {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: Option<Number>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub quantity_unit: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub value: Option<Number>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub value_currency: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rejected_quantity: Option<Number>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub rejected_quantity_unit: Option<String>,
}

/// Read-only view of the business fields shared by a submission and a stored report.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFields {
    #[serde(default, deserialize_with = "lenient::text")]
    pub regional_office: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub other_office: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub service_type: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub client_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub contact_number: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub trade_cid_number: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub document_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::commodities")]
    pub commodities: Vec<Commodity>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub movement_from: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub movement_to: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub service_provider: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fines: Option<Number>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub receipt_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub remarks: Option<String>,
}

/// Candidate report produced by the submission form. Any `id` it carries is ignored by the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportInput {
    pub body: Payload,
}

impl ReportInput {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        Payload::from_value(value).map(|body| Self { body })
    }

    /// A date field as submitted; `None` when absent or neither text nor an integer.
    pub fn date(&self, key: &str) -> Option<DateInput> {
        match self.body.value(key)? {
            Value::String(s) => Some(DateInput::Text(s)),
            Value::Number(n) => n.as_i64().map(DateInput::Millis),
            _ => None,
        }
    }

    pub fn fields(&self) -> ReportFields {
        self.body.fields()
    }
}

/// A persisted report: the caller's fields verbatim plus the injected id.
/// The date fields hold canonical timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub id: ReportId,
    pub body: Payload,
}

impl Report {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&value.to_string())
    }

    pub fn fields(&self) -> ReportFields {
        self.body.fields()
    }

    pub fn application_date(&self) -> Option<String> {
        self.body.text(APPLICATION_DATE)
    }

    pub fn inspection_date(&self) -> Option<String> {
        self.body.text(INSPECTION_DATE)
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.body.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in self.body.iter().filter(|(key, _)| *key != "id") {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Report {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut body = Payload::deserialize(deserializer)?;
        let raw = body.remove("id").ok_or_else(|| de::Error::missing_field("id"))?;
        let id: String = serde_json::from_str(raw.get()).map_err(de::Error::custom)?;
        if id.is_empty() {
            return Err(de::Error::custom("report id is empty"));
        }
        Ok(Self { id: ReportId::from(id), body })
    }
}
