//! The versioned catalog dataset the seeder loads from.
//!
//! The built-in dataset ships with the crate (`data/catalog.json`). A deployment can
//! point `catalog.dataset` at another file with the same shape to update the catalog
//! without a rebuild.

use crate::error::{CatalogError, Result};
use crate::model::NewInstitution;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const BUILTIN_JSON: &str = include_str!("../data/catalog.json");

/// Immutable list of institutions in two partitions: public/government and private.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDataset {
    pub version: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub public: Vec<NewInstitution>,
    #[serde(default)]
    pub private: Vec<NewInstitution>,
}

impl CatalogDataset {
    /// The dataset embedded at build time.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_JSON)
    }

    /// Load a dataset file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::Dataset(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Load `path` when given, otherwise the built-in dataset.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let dataset: Self = serde_json::from_str(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Reject datasets without a version or with repeated institution names.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(CatalogError::Dataset("missing version".to_string()));
        }
        let mut seen = HashSet::new();
        for record in self.records() {
            if record.name.trim().is_empty() {
                return Err(CatalogError::Dataset(
                    "institution with empty name".to_string(),
                ));
            }
            if !seen.insert(record.name.as_str()) {
                return Err(CatalogError::Dataset(format!(
                    "duplicate institution name: {}",
                    record.name
                )));
            }
        }
        Ok(())
    }

    /// Public institutions followed by private ones.
    pub fn records(&self) -> impl Iterator<Item = &NewInstitution> {
        self.public.iter().chain(self.private.iter())
    }

    pub fn len(&self) -> usize {
        self.public.len() + self.private.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
