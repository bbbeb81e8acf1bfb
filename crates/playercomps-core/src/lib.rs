// Shared configuration for the player comparison workspace: comps.toml
// settings and the feature weight profiles.

pub mod config;
pub mod weights;

pub use config::{Config, ConfigError, DataConfig, SeasonRange, DEFAULT_TOP_N};
pub use weights::{WeightError, WeightProfiles, WeightTable, DEFAULT_WEIGHT};
