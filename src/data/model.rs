use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Keys that carry identity/position and never become metadata fields.
pub const RESERVED_KEYS: [&str; 4] = ["id", "x", "y", "z"];

/// Metadata key used as the display label of a record.
pub const HEADER_KEY: &str = "header";

// ---------------------------------------------------------------------------
// MetadataValue – a single metadata cell
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value mirroring the JSON scalar kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl MetadataValue {
    pub fn from_json(val: &JsonValue) -> Self {
        match val {
            JsonValue::String(s) => MetadataValue::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    MetadataValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    MetadataValue::Float(f)
                } else {
                    MetadataValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => MetadataValue::Bool(*b),
            JsonValue::Null => MetadataValue::Null,
            other => MetadataValue::String(other.to_string()),
        }
    }

    /// Guess the type of a textual cell (CSV). Empty cells are null.
    pub fn from_text(s: &str) -> Self {
        if s.is_empty() {
            return MetadataValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return MetadataValue::Float(f);
        }
        // pandas writes booleans capitalised.
        match s {
            "true" | "True" => return MetadataValue::Bool(true),
            "false" | "False" => return MetadataValue::Bool(false),
            _ => {}
        }
        MetadataValue::String(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetadataValue::Null)
    }

    /// The string every filter comparison is made on.
    ///
    /// Numbers and strings collapse onto the same key space: `Integer(1)`,
    /// `Float(1.0)` and `String("1")` all produce `"1"`.
    pub fn filter_key(&self) -> String {
        match self {
            MetadataValue::String(s) => s.clone(),
            MetadataValue::Integer(i) => i.to_string(),
            MetadataValue::Float(v) => format_number(*v),
            MetadataValue::Bool(b) => b.to_string(),
            MetadataValue::Null => "null".to_string(),
        }
    }
}

/// Shortest decimal form of a float, integral values without a fraction.
/// Very large and very small magnitudes use exponent notation (`1e+21`, `1e-7`).
fn format_number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let s = if v > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if v == 0.0 {
        "0".to_string()
    } else if v.abs() >= 1e21 || v.abs() < 1e-6 {
        let sci = format!("{v:e}");
        match sci.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => sci,
        }
    } else {
        format!("{v}")
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filter_key())
    }
}

// ---------------------------------------------------------------------------
// Record – one vector with coordinates and metadata
// ---------------------------------------------------------------------------

/// A single vector projected to 3D, plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Every non-reserved key, `header` included.
    #[serde(flatten)]
    pub metadata: BTreeMap<String, MetadataValue>,
}

/// Why a raw record was rejected during ingestion.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing or invalid 'id'")]
    InvalidId,

    #[error("missing or non-numeric '{0}' coordinate")]
    MissingCoordinate(&'static str),

    #[error("non-finite '{0}' coordinate")]
    NonFiniteCoordinate(&'static str),

    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    #[error("malformed row: {0}")]
    Malformed(String),
}

impl Record {
    pub fn new(id: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Record {
            id: id.into(),
            x,
            y,
            z,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: MetadataValue) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Parse one JSON object of the `{id, x, y, z, header?, ...}` shape.
    pub fn from_json_object(obj: &Map<String, JsonValue>) -> Result<Self, RecordError> {
        let id = match obj.get("id") {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => return Err(RecordError::InvalidId),
        };

        let coord = |axis: &'static str| -> Result<f64, RecordError> {
            let v = obj
                .get(axis)
                .and_then(JsonValue::as_f64)
                .ok_or(RecordError::MissingCoordinate(axis))?;
            check_finite(axis, v)
        };
        let (x, y, z) = (coord("x")?, coord("y")?, coord("z")?);

        let metadata = obj
            .iter()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(key, val)| (key.clone(), MetadataValue::from_json(val)))
            .collect();

        Ok(Record { id, x, y, z, metadata })
    }

    /// Stringified value of a metadata field; `None` if the record lacks it.
    pub fn filter_key(&self, field: &str) -> Option<String> {
        self.metadata.get(field).map(MetadataValue::filter_key)
    }

    /// Display text of the `header` field. Non-string headers are shown in
    /// their stringified form; null, empty, `false` and zero count as absent.
    pub fn header(&self) -> Option<String> {
        match self.metadata.get(HEADER_KEY)? {
            MetadataValue::Null | MetadataValue::Bool(false) | MetadataValue::Integer(0) => None,
            MetadataValue::Float(v) if *v == 0.0 || v.is_nan() => None,
            MetadataValue::String(s) if s.is_empty() => None,
            other => Some(other.filter_key()),
        }
    }

    /// Header if present, else the id.
    pub fn label(&self) -> String {
        match self.header() {
            Some(h) => format!("Header: {h}"),
            None => format!("ID: {}", self.id),
        }
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// (label, value) rows for the point inspector: header/id first, then
    /// metadata, then coordinates rounded to four decimals.
    pub fn inspector_rows(&self) -> Vec<(String, String)> {
        let mut rows = Vec::with_capacity(self.metadata.len() + 4);
        if let Some(h) = self.header() {
            rows.push(("Header".to_string(), h));
        }
        rows.push(("ID".to_string(), self.id.clone()));
        for (key, val) in &self.metadata {
            if key == HEADER_KEY {
                continue;
            }
            rows.push((key.clone(), val.to_string()));
        }
        rows.push(("X".to_string(), format!("{:.4}", self.x)));
        rows.push(("Y".to_string(), format!("{:.4}", self.y)));
        rows.push(("Z".to_string(), format!("{:.4}", self.z)));
        rows
    }
}

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

pub fn check_finite(axis: &'static str, v: f64) -> Result<f64, RecordError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(RecordError::NonFiniteCoordinate(axis))
    }
}

// ---------------------------------------------------------------------------
// RecordStore – the immutable loaded dataset
// ---------------------------------------------------------------------------

/// The full dataset of a session. Never mutated after ingestion.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    /// Raw records dropped during ingestion.
    rejected: usize,
}

impl RecordStore {
    /// Build a store from candidate records, dropping later duplicates of an id.
    pub fn ingest(candidates: Vec<Result<Record, RecordError>>) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
        let mut records = Vec::with_capacity(candidates.len());
        let mut rejected = 0;

        for (pos, candidate) in candidates.into_iter().enumerate() {
            let outcome = candidate.and_then(|rec| {
                if seen.insert(rec.id.clone()) {
                    Ok(rec)
                } else {
                    Err(RecordError::DuplicateId(rec.id))
                }
            });
            match outcome {
                Ok(rec) => records.push(rec),
                Err(e) => {
                    log::warn!("Skipping record #{pos}: {e}");
                    rejected += 1;
                }
            }
        }

        RecordStore { records, rejected }
    }

    /// Parse a JSON array of record objects, rejecting bad entries one by one.
    pub fn from_json_array(items: &[JsonValue]) -> Self {
        let candidates = items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or(RecordError::NotAnObject)
                    .and_then(Record::from_json_object)
            })
            .collect();
        Self::ingest(candidates)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
