//! Configuration for schema inference

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::semantic::{CustomDetectors, SemanticDetector, SemanticTypes};

/// Configuration for schema inference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerConfig {
    /// Keep a bounded sample of primitive values per field and type
    pub store_values: bool,

    /// Built-in semantic type detection
    pub semantic_types: SemanticTypes,

    /// Seed for value sampling (random when not set)
    pub seed: Option<u64>,

    /// Caller-supplied semantic detectors
    #[serde(skip)]
    pub custom_detectors: CustomDetectors,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            store_values: true,
            semantic_types: SemanticTypes::Disabled,
            seed: None,
            custom_detectors: CustomDetectors::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder::default()
    }
}

/// Builder for AnalyzerConfig
#[derive(Debug, Default)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
    semantic_types: Option<SemanticTypes>,
}

impl AnalyzerConfigBuilder {
    /// Enable or disable value sampling
    pub fn store_values(mut self, store: bool) -> Self {
        self.config.store_values = store;
        self
    }

    /// Enable or disable every built-in semantic detector
    pub fn semantic_types(mut self, enabled: bool) -> Self {
        self.semantic_types = Some(if enabled {
            SemanticTypes::All
        } else {
            SemanticTypes::Disabled
        });
        self
    }

    /// Enable only the named built-in detectors
    pub fn semantic_types_named<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.semantic_types = Some(SemanticTypes::selected(names));
        self
    }

    /// Install a custom semantic detector
    ///
    /// Without an explicit built-in selection this enables detection with no
    /// built-ins; `semantic_types(false)` still disables it.
    pub fn detector(mut self, detector: impl SemanticDetector + 'static) -> Self {
        self.config.custom_detectors.0.push(Arc::new(detector));
        self
    }

    /// Seed the sampling RNG for reproducible samples
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Build the configuration
    pub fn build(mut self) -> AnalyzerConfig {
        self.config.semantic_types = match self.semantic_types {
            Some(semantic_types) => semantic_types,
            None if !self.config.custom_detectors.is_empty() => {
                SemanticTypes::Selected(BTreeMap::new())
            }
            None => SemanticTypes::Disabled,
        };
        self.config
    }
}
