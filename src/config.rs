//! Inline JSON configuration models.
//!
//! Decoded once per run by the binary and read-only thereafter.

use crate::error::{OptimizerError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

fn default_fid_column() -> String {
    "fid".to_string()
}

fn default_geom_column() -> String {
    "geom".to_string()
}

/// Per-table parameters for the OAF pipeline.
#[derive(Clone, Debug, Deserialize)]
pub struct LayerConfig {
    /// Primary identifier column.
    #[serde(default = "default_fid_column")]
    pub fid_column: String,
    /// Geometry column feeding the extent functions.
    #[serde(default = "default_geom_column")]
    pub geom_column: String,
    /// Columns seeding the deterministic external identifier; absent skips
    /// that step.
    #[serde(default)]
    pub external_fid_columns: Option<Vec<String>>,
    /// Columns of the temporal index; absent skips that step.
    #[serde(default)]
    pub temporal_columns: Option<Vec<String>>,
    /// Statements executed verbatim before any other step for the table.
    #[serde(default)]
    pub sql_statements: Vec<String>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            fid_column: default_fid_column(),
            geom_column: default_geom_column(),
            external_fid_columns: None,
            temporal_columns: None,
            sql_statements: Vec::new(),
        }
    }
}

impl LayerConfig {
    // An explicitly empty list behaves like an absent one.
    pub(crate) fn external_fid_columns(&self) -> Option<&[String]> {
        self.external_fid_columns
            .as_deref()
            .filter(|columns| !columns.is_empty())
    }

    pub(crate) fn temporal_columns(&self) -> Option<&[String]> {
        self.temporal_columns
            .as_deref()
            .filter(|columns| !columns.is_empty())
    }
}

/// OAF service configuration: one entry per table to optimize.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OafConfig {
    #[serde(default)]
    pub layers: BTreeMap<String, LayerConfig>,
}

impl OafConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One explicit index specification for the OWS pipeline.
#[derive(Clone, Debug, Deserialize)]
pub struct IndexSpec {
    pub table: String,
    pub columns: Vec<String>,
    pub name: String,
    #[serde(default)]
    pub unique: bool,
}

/// OWS service configuration: explicit extra indexes created after the
/// per-table identifier steps.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OwsConfig {
    #[serde(default)]
    pub indices: Vec<IndexSpec>,
}

impl OwsConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the whole list before any index is created: names must be
    /// unique across the configuration and column lists non-empty.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.indices {
            if spec.columns.is_empty() {
                return Err(OptimizerError::EmptyIndexColumns {
                    name: spec.name.clone(),
                });
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(OptimizerError::DuplicateIndexName {
                    name: spec.name.clone(),
                });
            }
        }
        Ok(())
    }
}
