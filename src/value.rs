//! Store-native document values
//!
//! [`Value`] models the full value taxonomy of a BSON document store, which is
//! richer than plain JSON (typed integers, decimals, object ids, dates, binary
//! data and so on). Values are read from either relaxed or canonical
//! Extended JSON and written back as relaxed Extended JSON, which is also the
//! canonical string form used for uniqueness accounting.

use std::borrow::Cow;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value as JsonValue, json};

use crate::inference::InferenceError;

/// An insertion-ordered document
pub type Document = IndexMap<String, Value>;

/// A single store-native value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// Deprecated BSON undefined; treated as an omitted field during ingestion
    Undefined,
    Boolean(bool),
    /// Untyped JSON number
    Number(Number),
    Int32(i32),
    Long(i64),
    Double(f64),
    /// Decimal128 kept in its decimal string form
    Decimal128(String),
    String(String),
    /// Object id as 24 lowercase hex characters
    ObjectId(String),
    /// Milliseconds since the Unix epoch, over the full 64-bit range
    Date(i64),
    Timestamp {
        t: u32,
        i: u32,
    },
    Binary {
        sub_type: u8,
        bytes: Vec<u8>,
    },
    RegExp {
        pattern: String,
        options: String,
    },
    Code {
        code: String,
        scope: Option<Document>,
    },
    Symbol(String),
    MinKey,
    MaxKey,
    DBRef {
        collection: String,
        id: Box<Value>,
        db: Option<String>,
    },
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Read a value from relaxed or canonical Extended JSON
    pub fn from_extended_json(json: JsonValue) -> Result<Self, InferenceError> {
        match json {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => Ok(Value::Boolean(b)),
            JsonValue::Number(n) => Ok(Value::Number(n)),
            JsonValue::String(s) => Ok(Value::String(s)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(Value::from_extended_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            JsonValue::Object(map) => Self::from_extended_object(map),
        }
    }

    /// Parse a single Extended JSON text
    pub fn parse_extended_json(text: &str) -> Result<Self, InferenceError> {
        let json: JsonValue = serde_json::from_str(text)?;
        Self::from_extended_json(json)
    }

    fn from_extended_object(map: Map<String, JsonValue>) -> Result<Self, InferenceError> {
        if let Some(value) = read_wrapper(&map)? {
            return Ok(value);
        }

        let mut document = Document::with_capacity(map.len());
        for (key, value) in map {
            document.insert(key, Value::from_extended_json(value)?);
        }
        Ok(Value::Document(document))
    }

    /// Write this value as relaxed Extended JSON
    pub fn to_relaxed_extended_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Undefined => json!({ "$undefined": true }),
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(n.clone()),
            Value::Int32(i) => json!(i),
            Value::Long(l) => json!(l),
            Value::Double(d) => match Number::from_f64(*d) {
                Some(n) => JsonValue::Number(n),
                None => json!({ "$numberDouble": non_finite_label(*d) }),
            },
            Value::Decimal128(d) => json!({ "$numberDecimal": d }),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::ObjectId(oid) => json!({ "$oid": oid }),
            Value::Date(millis) => match Utc.timestamp_millis_opt(*millis).single() {
                Some(date) if (1970..=9999).contains(&date.year()) => {
                    json!({ "$date": date.to_rfc3339_opts(SecondsFormat::Millis, true) })
                }
                _ => json!({ "$date": { "$numberLong": millis.to_string() } }),
            },
            Value::Timestamp { t, i } => json!({ "$timestamp": { "t": t, "i": i } }),
            Value::Binary { sub_type, bytes } => json!({
                "$binary": {
                    "base64": BASE64.encode(bytes),
                    "subType": format!("{:02x}", sub_type),
                }
            }),
            Value::RegExp { pattern, options } => json!({
                "$regularExpression": { "pattern": pattern, "options": options }
            }),
            Value::Code { code, scope } => match scope {
                Some(scope) => json!({ "$code": code, "$scope": document_to_json(scope) }),
                None => json!({ "$code": code }),
            },
            Value::Symbol(s) => json!({ "$symbol": s }),
            Value::MinKey => json!({ "$minKey": 1 }),
            Value::MaxKey => json!({ "$maxKey": 1 }),
            Value::DBRef { collection, id, db } => {
                let mut map = Map::new();
                map.insert("$ref".to_string(), JsonValue::String(collection.clone()));
                map.insert("$id".to_string(), id.to_relaxed_extended_json());
                if let Some(db) = db {
                    map.insert("$db".to_string(), JsonValue::String(db.clone()));
                }
                JsonValue::Object(map)
            }
            Value::Array(items) => {
                JsonValue::Array(items.iter().map(Value::to_relaxed_extended_json).collect())
            }
            Value::Document(document) => document_to_json(document),
        }
    }

    /// Canonical string form used to compare sampled values
    pub fn canonical_string(&self) -> String {
        self.to_relaxed_extended_json().to_string()
    }

    /// Short label of the value's shape, for error messages
    pub fn kind_label(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Boolean(_) => "boolean",
            Value::Number(_) | Value::Int32(_) | Value::Long(_) | Value::Double(_) => "number",
            Value::Decimal128(_) => "decimal",
            Value::String(_) | Value::Symbol(_) => "string",
            Value::Array(_) => "array",
            Value::Document(_) | Value::DBRef { .. } => "document",
            _ => "scalar",
        }
    }

    /// Fields of a value stored as a document
    ///
    /// A DBRef is itself a document of `$ref`, `$id` and optional `$db`.
    pub fn to_document(&self) -> Option<Cow<'_, Document>> {
        match self {
            Value::Document(document) => Some(Cow::Borrowed(document)),
            Value::DBRef { collection, id, db } => {
                let mut document = Document::new();
                document.insert("$ref".to_string(), Value::String(collection.clone()));
                document.insert("$id".to_string(), (**id).clone());
                if let Some(db) = db {
                    document.insert("$db".to_string(), Value::String(db.clone()));
                }
                Some(Cow::Owned(document))
            }
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(document) => Some(document),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of any numeric variant
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            Value::Int32(i) => Some(f64::from(*i)),
            Value::Long(l) => Some(*l as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_relaxed_extended_json())
    }
}

impl TryFrom<JsonValue> for Value {
    type Error = InferenceError;

    fn try_from(json: JsonValue) -> Result<Self, Self::Error> {
        Value::from_extended_json(json)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Document(document)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_relaxed_extended_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        Value::from_extended_json(json).map_err(serde::de::Error::custom)
    }
}

fn document_to_json(document: &Document) -> JsonValue {
    JsonValue::Object(
        document
            .iter()
            .map(|(key, value)| (key.clone(), value.to_relaxed_extended_json()))
            .collect(),
    )
}

fn non_finite_label(d: f64) -> &'static str {
    if d.is_nan() {
        "NaN"
    } else if d > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

fn ejson_error(message: impl Into<String>) -> InferenceError {
    InferenceError::ExtendedJson {
        message: message.into(),
    }
}

fn expect_str<'a>(value: &'a JsonValue, wrapper: &str) -> Result<&'a str, InferenceError> {
    value
        .as_str()
        .ok_or_else(|| ejson_error(format!("{wrapper} must be a string, found {value}")))
}

fn expect_u32(value: Option<&JsonValue>, wrapper: &str) -> Result<u32, InferenceError> {
    value
        .and_then(JsonValue::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ejson_error(format!("{wrapper} requires unsigned 32-bit integers")))
}

/// Recognize an Extended JSON type wrapper; `None` means an ordinary document
fn read_wrapper(map: &Map<String, JsonValue>) -> Result<Option<Value>, InferenceError> {
    let single = |key: &str| if map.len() == 1 { map.get(key) } else { None };

    if let Some(oid) = single("$oid") {
        let hex = expect_str(oid, "$oid")?;
        if hex.len() != 24 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ejson_error(format!("invalid object id '{hex}'")));
        }
        return Ok(Some(Value::ObjectId(hex.to_ascii_lowercase())));
    }

    if let Some(n) = single("$numberInt") {
        let text = expect_str(n, "$numberInt")?;
        let parsed = text
            .parse::<i32>()
            .map_err(|e| ejson_error(format!("invalid $numberInt '{text}': {e}")))?;
        return Ok(Some(Value::Int32(parsed)));
    }

    if let Some(n) = single("$numberLong") {
        let text = expect_str(n, "$numberLong")?;
        let parsed = text
            .parse::<i64>()
            .map_err(|e| ejson_error(format!("invalid $numberLong '{text}': {e}")))?;
        return Ok(Some(Value::Long(parsed)));
    }

    if let Some(n) = single("$numberDouble") {
        let text = expect_str(n, "$numberDouble")?;
        let parsed = match text {
            "Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            "NaN" => f64::NAN,
            _ => text
                .parse::<f64>()
                .map_err(|e| ejson_error(format!("invalid $numberDouble '{text}': {e}")))?,
        };
        return Ok(Some(Value::Double(parsed)));
    }

    if let Some(n) = single("$numberDecimal") {
        let text = expect_str(n, "$numberDecimal")?;
        return Ok(Some(Value::Decimal128(text.to_string())));
    }

    if let Some(date) = single("$date") {
        return read_date(date).map(Some);
    }

    if let Some(ts) = single("$timestamp") {
        let t = expect_u32(ts.get("t"), "$timestamp")?;
        let i = expect_u32(ts.get("i"), "$timestamp")?;
        return Ok(Some(Value::Timestamp { t, i }));
    }

    if let Some(binary) = map.get("$binary") {
        return read_binary(binary, map).map(Some);
    }

    if let Some(regex) = single("$regularExpression") {
        let pattern = regex
            .get("pattern")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| ejson_error("$regularExpression requires a pattern"))?;
        let options = regex.get("options").and_then(JsonValue::as_str).unwrap_or("");
        return Ok(Some(Value::RegExp {
            pattern: pattern.to_string(),
            options: options.to_string(),
        }));
    }

    // Legacy form; a `$regex` holding anything but a string is a query operator.
    if let Some(JsonValue::String(pattern)) = map.get("$regex") {
        let options = match (map.len(), map.get("$options")) {
            (1, None) => Some(""),
            (2, Some(JsonValue::String(options))) => Some(options.as_str()),
            _ => None,
        };
        if let Some(options) = options {
            return Ok(Some(Value::RegExp {
                pattern: pattern.clone(),
                options: options.to_string(),
            }));
        }
    }

    if let Some(code) = map.get("$code") {
        let code = expect_str(code, "$code")?.to_string();
        return match (map.len(), map.get("$scope")) {
            (1, None) => Ok(Some(Value::Code { code, scope: None })),
            (2, Some(JsonValue::Object(scope))) => {
                let Value::Document(scope) = Value::from_extended_object(scope.clone())? else {
                    return Err(ejson_error("$scope must be a document"));
                };
                Ok(Some(Value::Code {
                    code,
                    scope: Some(scope),
                }))
            }
            _ => Err(ejson_error("$code accepts only an optional $scope document")),
        };
    }

    if let Some(symbol) = single("$symbol") {
        return Ok(Some(Value::Symbol(expect_str(symbol, "$symbol")?.to_string())));
    }

    if single("$minKey").is_some() {
        return Ok(Some(Value::MinKey));
    }

    if single("$maxKey").is_some() {
        return Ok(Some(Value::MaxKey));
    }

    if single("$undefined").is_some() {
        return Ok(Some(Value::Undefined));
    }

    if let (Some(JsonValue::String(collection)), Some(id)) = (map.get("$ref"), map.get("$id")) {
        let db = map.get("$db").and_then(JsonValue::as_str).map(str::to_string);
        let extra = map
            .keys()
            .any(|key| !matches!(key.as_str(), "$ref" | "$id" | "$db"));
        if !extra {
            return Ok(Some(Value::DBRef {
                collection: collection.clone(),
                id: Box::new(Value::from_extended_json(id.clone())?),
                db,
            }));
        }
    }

    Ok(None)
}

fn read_date(date: &JsonValue) -> Result<Value, InferenceError> {
    let millis = match date {
        JsonValue::String(text) => DateTime::parse_from_rfc3339(text)
            .map_err(|e| ejson_error(format!("invalid $date '{text}': {e}")))?
            .timestamp_millis(),
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| ejson_error(format!("invalid $date millis {n}")))?,
        JsonValue::Object(inner) => {
            let text = inner
                .get("$numberLong")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| ejson_error("$date object requires $numberLong"))?;
            text.parse::<i64>()
                .map_err(|e| ejson_error(format!("invalid $date millis '{text}': {e}")))?
        }
        other => return Err(ejson_error(format!("invalid $date {other}"))),
    };
    Ok(Value::Date(millis))
}

fn read_binary(binary: &JsonValue, map: &Map<String, JsonValue>) -> Result<Value, InferenceError> {
    // Canonical form nests base64/subType; the legacy form puts $type beside $binary.
    let (payload, sub_type) = match (binary, map.get("$type")) {
        (JsonValue::Object(inner), None) if map.len() == 1 => (
            inner.get("base64").and_then(JsonValue::as_str),
            inner.get("subType").and_then(JsonValue::as_str),
        ),
        (JsonValue::String(payload), Some(sub_type)) if map.len() == 2 => {
            (Some(payload.as_str()), sub_type.as_str())
        }
        _ => return Err(ejson_error("malformed $binary wrapper")),
    };

    let payload = payload.ok_or_else(|| ejson_error("$binary requires base64"))?;
    let sub_type = sub_type.ok_or_else(|| ejson_error("$binary requires subType"))?;

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| ejson_error(format!("invalid $binary payload: {e}")))?;
    let sub_type = u8::from_str_radix(sub_type, 16)
        .map_err(|e| ejson_error(format!("invalid $binary subType '{sub_type}': {e}")))?;

    Ok(Value::Binary { sub_type, bytes })
}
