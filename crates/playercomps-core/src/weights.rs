// Feature weight profiles (weights.toml).
//
// A profile maps a feature column name to a multiplier applied after
// standardization. Unlisted columns get DEFAULT_WEIGHT.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

/// Multiplier for any feature absent from a profile.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Shipped profiles, compiled in so the engine works without a config dir.
const BUILTIN_WEIGHTS: &str = include_str!("../../../defaults/weights.toml");

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum WeightError {
    #[error("failed to read weight file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse weight profiles: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("profile `{profile}`: weight for `{stat}` must be a positive finite number, got {value}")]
    InvalidWeight {
        profile: String,
        stat: String,
        value: f64,
    },
}

// ---------------------------------------------------------------------------
// WeightTable
// ---------------------------------------------------------------------------

/// Feature name to importance multiplier.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: HashMap<String, f64>,
}

impl WeightTable {
    /// Build a table from `(stat, weight)` pairs. Later pairs win.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            weights: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn weight_for(&self, stat: &str) -> f64 {
        self.weights.get(stat).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// Weights lined up with `feature_names`, one per column.
    pub fn weight_vector<S: AsRef<str>>(&self, feature_names: &[S]) -> Vec<f64> {
        feature_names
            .iter()
            .map(|name| self.weight_for(name.as_ref()))
            .collect()
    }

    /// Stat names with an explicit weight, in no particular order.
    pub fn stats(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    fn validate(&self, profile: &str) -> Result<(), WeightError> {
        // Sorted so the reported stat is stable across runs.
        let sorted: BTreeMap<&String, &f64> = self.weights.iter().collect();
        for (stat, &value) in sorted {
            if !value.is_finite() || value <= 0.0 {
                return Err(WeightError::InvalidWeight {
                    profile: profile.to_string(),
                    stat: stat.clone(),
                    value,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WeightProfiles
// ---------------------------------------------------------------------------

/// Every profile defined in a weights.toml file, keyed by table name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct WeightProfiles {
    profiles: BTreeMap<String, WeightTable>,
}

impl WeightProfiles {
    /// Parse and validate profiles from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, WeightError> {
        let profiles: WeightProfiles = toml::from_str(text)?;
        for (name, table) in &profiles.profiles {
            table.validate(name)?;
        }
        Ok(profiles)
    }

    pub fn load(path: &Path) -> Result<Self, WeightError> {
        let text = std::fs::read_to_string(path).map_err(|e| WeightError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&text)
    }

    /// The profiles shipped in `defaults/weights.toml`.
    pub fn builtin() -> Result<Self, WeightError> {
        Self::from_toml_str(BUILTIN_WEIGHTS)
    }

    pub fn profile(&self, name: &str) -> Option<&WeightTable> {
        self.profiles.get(name)
    }

    /// Profile names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
