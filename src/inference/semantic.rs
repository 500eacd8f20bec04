//! Semantic type detection
//!
//! A semantic detector refines the base classification of a value, e.g. a
//! string that looks like an e-mail address is reported as `Email` instead of
//! `String`. Detectors only rename a type; the base classification still
//! decides how the value is accumulated and how dialects render it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A pluggable semantic type detector
pub trait SemanticDetector: Send + Sync {
    /// Type name reported when the detector matches
    fn name(&self) -> &str;

    /// Whether `value` found at `path` is of this semantic type
    fn matches(&self, value: &Value, path: &[String]) -> bool;
}

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$")
        .unwrap()
});

/// Strings shaped like an e-mail address
#[derive(Debug, Default, Clone, Copy)]
pub struct EmailDetector;

impl SemanticDetector for EmailDetector {
    fn name(&self) -> &str {
        "Email"
    }

    fn matches(&self, value: &Value, _path: &[String]) -> bool {
        value.as_str().is_some_and(|s| EMAIL_REGEX.is_match(s))
    }
}

/// GeoJSON `Point` documents
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoJsonDetector;

impl SemanticDetector for GeoJsonDetector {
    fn name(&self) -> &str {
        "GeoJSON"
    }

    fn matches(&self, value: &Value, _path: &[String]) -> bool {
        let Some(document) = value.as_document() else {
            return false;
        };
        if document.get("type").and_then(Value::as_str) != Some("Point") {
            return false;
        }
        let Some(Value::Array(coordinates)) = document.get("coordinates") else {
            return false;
        };
        match coordinates.as_slice() {
            [lng, lat] => match (lng.as_f64(), lat.as_f64()) {
                (Some(lng), Some(lat)) => {
                    (-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat)
                }
                _ => false,
            },
            _ => false,
        }
    }
}

/// Built-in detectors in evaluation order
pub fn builtin_detectors() -> Vec<Arc<dyn SemanticDetector>> {
    vec![Arc::new(EmailDetector), Arc::new(GeoJsonDetector)]
}

/// Which built-in detectors are enabled
///
/// `Disabled` turns semantic detection off entirely, custom detectors included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SemanticTypesRepr", into = "SemanticTypesRepr")]
pub enum SemanticTypes {
    /// No built-in detection
    #[default]
    Disabled,
    /// Every built-in detector
    All,
    /// Only built-ins whose (case-insensitive) name maps to `true`, plus any
    /// custom detectors
    Selected(BTreeMap<String, bool>),
}

impl SemanticTypes {
    /// Select detectors by name
    pub fn selected<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SemanticTypes::Selected(names.into_iter().map(|n| (n.into(), true)).collect())
    }

    /// Whether the built-in detector `name` is enabled
    pub fn enables(&self, name: &str) -> bool {
        match self {
            SemanticTypes::Disabled => false,
            SemanticTypes::All => true,
            SemanticTypes::Selected(names) => names
                .iter()
                .any(|(key, enabled)| *enabled && key.eq_ignore_ascii_case(name)),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SemanticTypesRepr {
    Flag(bool),
    Named(BTreeMap<String, bool>),
}

impl From<SemanticTypesRepr> for SemanticTypes {
    fn from(repr: SemanticTypesRepr) -> Self {
        match repr {
            SemanticTypesRepr::Flag(true) => SemanticTypes::All,
            SemanticTypesRepr::Flag(false) => SemanticTypes::Disabled,
            SemanticTypesRepr::Named(names) => SemanticTypes::Selected(names),
        }
    }
}

impl From<SemanticTypes> for SemanticTypesRepr {
    fn from(types: SemanticTypes) -> Self {
        match types {
            SemanticTypes::All => SemanticTypesRepr::Flag(true),
            SemanticTypes::Disabled => SemanticTypesRepr::Flag(false),
            SemanticTypes::Selected(names) => SemanticTypesRepr::Named(names),
        }
    }
}

/// Caller-supplied detectors, installed after the enabled built-ins unless
/// detection is disabled
#[derive(Clone, Default)]
pub struct CustomDetectors(pub Vec<Arc<dyn SemanticDetector>>);

impl CustomDetectors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CustomDetectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|d| d.name()))
            .finish()
    }
}

/// Resolve the ordered detector chain for one analyzer
pub fn detector_chain(
    semantic_types: &SemanticTypes,
    custom: &CustomDetectors,
) -> Vec<Arc<dyn SemanticDetector>> {
    if *semantic_types == SemanticTypes::Disabled {
        return Vec::new();
    }
    builtin_detectors()
        .into_iter()
        .filter(|d| semantic_types.enables(d.name()))
        .chain(custom.0.iter().cloned())
        .collect()
}
