// Season-level player similarity: load season tables, build weighted
// standardized feature vectors, and rank comparable seasons by cosine
// similarity.

pub mod error;
pub mod features;
pub mod index;
pub mod loader;
pub mod normalize;
pub mod similarity;
pub mod weighting;

pub use error::{BuildError, QueryError};
pub use index::{
    build_index, build_index_from_paths, find_similar, IndexOptions, IndexSummary,
    SimilarPlayer, SimilarityIndex, StatLine, StatValue,
};
pub use loader::{RawTable, SeasonIdentity};
