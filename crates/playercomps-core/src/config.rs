// Configuration loading and parsing (comps.toml, weights.toml).

use crate::weights::{WeightError, WeightProfiles, WeightTable};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Number of comparable seasons returned when a query does not say.
pub const DEFAULT_TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid weights in {path}: {source}")]
    WeightsError { path: PathBuf, source: WeightError },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Season range
// ---------------------------------------------------------------------------

/// Inclusive season bounds. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SeasonRange {
    #[serde(default)]
    pub min: Option<i32>,
    #[serde(default)]
    pub max: Option<i32>,
}

impl SeasonRange {
    pub fn starting(min: i32) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn contains(&self, season: i32) -> bool {
        self.min.map_or(true, |min| season >= min) && self.max.map_or(true, |max| season <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub data: DataConfig,
    pub seasons: SeasonRange,
    pub weight_profile: String,
    pub weights: WeightProfiles,
    pub top_n: usize,
}

impl Config {
    /// The weight table named by `weights.profile`.
    ///
    /// Always present after validation.
    pub fn active_weights(&self) -> Option<&WeightTable> {
        self.weights.profile(&self.weight_profile)
    }
}

// ---------------------------------------------------------------------------
// comps.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire comps.toml file.
#[derive(Debug, Clone, Deserialize)]
struct CompsFile {
    data: DataConfig,
    #[serde(default)]
    seasons: SeasonRange,
    weights: WeightsSection,
    #[serde(default)]
    query: QuerySection,
}

#[derive(Debug, Clone, Deserialize)]
struct WeightsSection {
    profile: String,
}

#[derive(Debug, Clone, Deserialize)]
struct QuerySection {
    #[serde(default = "default_top_n")]
    top_n: usize,
}

impl Default for QuerySection {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_drop_columns() -> Vec<String> {
    vec!["birth_year".to_string()]
}

/// Input tables for the comparison index.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub primary: String,
    #[serde(default)]
    pub shooting: Option<String>,
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/comps.toml` and
/// `config/weights.toml` relative to the given `base_dir`.
///
/// Does not copy defaults; `load_config` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- comps.toml (required) ---
    let comps_path = config_dir.join("comps.toml");
    let comps_text = read_file(&comps_path)?;
    let comps: CompsFile = toml::from_str(&comps_text).map_err(|e| ConfigError::ParseError {
        path: comps_path.clone(),
        source: e,
    })?;

    // --- weights.toml (required) ---
    let weights_path = config_dir.join("weights.toml");
    let weights_text = read_file(&weights_path)?;
    let weights =
        WeightProfiles::from_toml_str(&weights_text).map_err(|e| ConfigError::WeightsError {
            path: weights_path.clone(),
            source: e,
        })?;

    let config = Config {
        data: comps.data,
        seasons: comps.seasons,
        weight_profile: comps.weights.profile,
        weights,
        top_n: comps.query.top_n,
    };

    validate(&config)?;

    debug!(
        "config loaded from {}: profile={}, seasons={:?}",
        config_dir.display(),
        config.weight_profile,
        config.seasons
    );

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                info!("copied default config to {}", target.display());
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Pick the directory to load configuration from.
///
/// The current directory wins when it has `config/` or `defaults/`;
/// otherwise the per-user config directory is used.
pub fn resolve_base_dir(cwd: &Path) -> PathBuf {
    if cwd.join("config").is_dir() || cwd.join("defaults").is_dir() {
        return cwd.to_path_buf();
    }
    match directories::ProjectDirs::from("", "", "playercomps") {
        Some(dirs) => {
            let user_dir = dirs.config_dir().to_path_buf();
            debug!("no config in {}, using {}", cwd.display(), user_dir.display());
            user_dir
        }
        None => cwd.to_path_buf(),
    }
}

/// Copy any missing defaults into `base_dir/config/`, then load.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    let copied = ensure_config_files(base_dir)?;
    if !copied.is_empty() {
        info!("initialized {} config files from defaults", copied.len());
    }
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.data.primary.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.primary".into(),
            message: "must name a CSV file".into(),
        });
    }

    if let (Some(min), Some(max)) = (config.seasons.min, config.seasons.max) {
        if min > max {
            return Err(ConfigError::ValidationError {
                field: "seasons".into(),
                message: format!("min ({min}) must not exceed max ({max})"),
            });
        }
    }

    if config.top_n == 0 {
        return Err(ConfigError::ValidationError {
            field: "query.top_n".into(),
            message: "must be > 0".into(),
        });
    }

    if config.active_weights().is_none() {
        let known: Vec<&str> = config.weights.names().collect();
        return Err(ConfigError::ValidationError {
            field: "weights.profile".into(),
            message: format!(
                "unknown profile `{}` (available: {})",
                config.weight_profile,
                known.join(", ")
            ),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
