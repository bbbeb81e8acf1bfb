// Error taxonomy for index construction and queries.

use playercomps_core::WeightError;
use thiserror::Error;

/// Failures while building an index. Any of these aborts construction;
/// no partial index is ever returned.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {source_name}: {source}")]
    Csv {
        source_name: String,
        source: csv::Error,
    },

    /// The primary table lacks one or more identity columns.
    #[error("{source_name} is missing required identity columns: {}", .missing.join(", "))]
    DataLoad {
        source_name: String,
        missing: Vec<String>,
    },

    /// The secondary table cannot be joined to the primary table.
    #[error("{source_name} cannot be joined: missing key column `{key}`")]
    Schema { source_name: String, key: String },

    #[error("{source_name} produced zero season rows")]
    EmptyDataset { source_name: String },

    #[error("unknown weight profile `{profile}`")]
    UnknownProfile { profile: String },

    #[error("built-in weight profiles are invalid: {0}")]
    Weights(#[from] WeightError),
}

/// Failures while answering a query. The index is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("no data for {player_name} in {season}")]
    NotFound { player_name: String, season: i32 },

    #[error("top_n must be at least 1")]
    InvalidTopN,
}
