// The comparison index: pipeline entry point and read-only queries.
//
// build_index runs load -> features -> standardize -> weight -> similarity
// once. Every query afterwards reads the precomputed matrix.

use crate::error::{BuildError, QueryError};
use crate::features::build_features;
use crate::loader::{load_season_table, LoadOptions, RawTable, SeasonIdentity, IDENTITY_COLUMNS};
use crate::normalize::Standardizer;
use crate::similarity::SimilarityMatrix;
use crate::weighting::{apply_weights, unmatched_weights};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use playercomps_core::{SeasonRange, WeightProfiles, WeightTable};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Everything `build_index` needs besides the tables themselves.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub season_filter: SeasonRange,
    pub drop_columns: Vec<String>,
    pub weights: WeightTable,
}

impl IndexOptions {
    /// No season filter, `birth_year` dropped.
    pub fn new(weights: WeightTable) -> Self {
        Self {
            season_filter: SeasonRange::default(),
            drop_columns: vec!["birth_year".to_string()],
            weights,
        }
    }

    /// Options using one of the compiled-in weight profiles
    /// (`per_100` or `shooting`).
    pub fn builtin(profile: &str) -> Result<Self, BuildError> {
        let profiles = WeightProfiles::builtin()?;
        let weights = profiles
            .profile(profile)
            .cloned()
            .ok_or_else(|| BuildError::UnknownProfile {
                profile: profile.to_string(),
            })?;
        Ok(Self::new(weights))
    }

    pub fn with_season_filter(mut self, season_filter: SeasonRange) -> Self {
        self.season_filter = season_filter;
        self
    }

    pub fn with_drop_columns(mut self, drop_columns: Vec<String>) -> Self {
        self.drop_columns = drop_columns;
        self
    }

    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            season_filter: self.season_filter,
            drop_columns: self.drop_columns.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// One ranked comparable season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPlayer {
    pub player_name: String,
    pub season: i32,
    pub team: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatValue {
    pub stat: String,
    pub value: f64,
}

/// A single stint row with its filled (unscaled) feature values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatLine {
    pub identity: SeasonIdentity,
    pub stats: Vec<StatValue>,
}

/// Shape and provenance of a built index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub rows: usize,
    pub features: usize,
    pub filled_cells: usize,
    pub zero_vectors: usize,
    pub built_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SimilarityIndex
// ---------------------------------------------------------------------------

/// Immutable result of the similarity pipeline.
///
/// `records`, the rows of `raw`, and the rows and columns of `similarity`
/// all share one row order.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    records: Vec<SeasonIdentity>,
    feature_names: Vec<String>,
    raw: Array2<f64>,
    similarity: SimilarityMatrix,
    /// First row for each (player, season).
    positions: HashMap<(String, i32), usize>,
    summary: IndexSummary,
}

/// Run the full pipeline over already-read tables.
pub fn build_index(
    primary: &RawTable,
    secondary: Option<&RawTable>,
    options: &IndexOptions,
) -> Result<SimilarityIndex, BuildError> {
    let table = load_season_table(primary, secondary, &options.load_options())?;
    let features = build_features(table, &IDENTITY_COLUMNS);

    let unmatched = unmatched_weights(&options.weights, &features.feature_names);
    if !unmatched.is_empty() {
        warn!(
            "{} weighted stats have no matching column: {}",
            unmatched.len(),
            unmatched.join(", ")
        );
    }

    let scaler = Standardizer::fit(&features.values);
    let constant: Vec<&str> = scaler
        .column_stats()
        .iter()
        .zip(features.feature_names.iter())
        .filter(|(stats, _)| stats.is_constant())
        .map(|(_, name)| name.as_str())
        .collect();
    if !constant.is_empty() {
        debug!(
            "{} constant features scale to zero: {}",
            constant.len(),
            constant.join(", ")
        );
    }
    let scaled = scaler.transform(&features.values);
    let weighted = apply_weights(scaled, &features.feature_names, &options.weights);
    let similarity = SimilarityMatrix::compute(&weighted);

    let mut positions = HashMap::with_capacity(features.identities.len());
    for (row, identity) in features.identities.iter().enumerate() {
        positions
            .entry((identity.player.clone(), identity.season))
            .or_insert(row);
    }

    let summary = IndexSummary {
        rows: features.identities.len(),
        features: features.feature_names.len(),
        filled_cells: features.filled_cells(),
        zero_vectors: similarity.zero_vectors(),
        built_at: Utc::now(),
    };
    info!(
        "index ready: {} rows, {} features, {} filled cells, {} zero vectors",
        summary.rows, summary.features, summary.filled_cells, summary.zero_vectors
    );

    Ok(SimilarityIndex {
        records: features.identities,
        feature_names: features.feature_names,
        raw: features.values,
        similarity,
        positions,
        summary,
    })
}

/// Read the CSV files at `primary` (and `secondary`) and build the index.
pub fn build_index_from_paths(
    primary: &Path,
    secondary: Option<&Path>,
    options: &IndexOptions,
) -> Result<SimilarityIndex, BuildError> {
    let primary = RawTable::load(primary)?;
    let secondary = secondary.map(RawTable::load).transpose()?;
    build_index(&primary, secondary.as_ref(), options)
}

/// The `top_n` seasons most similar to `player_name` in `season`.
pub fn find_similar(
    index: &SimilarityIndex,
    player_name: &str,
    season: i32,
    top_n: usize,
) -> Result<Vec<SimilarPlayer>, QueryError> {
    index.find_similar(player_name, season, top_n)
}

impl SimilarityIndex {
    /// Row of the first stint matching `player_name` exactly in `season`.
    pub fn resolve(&self, player_name: &str, season: i32) -> Result<usize, QueryError> {
        self.positions
            .get(&(player_name.to_string(), season))
            .copied()
            .ok_or_else(|| QueryError::NotFound {
                player_name: player_name.to_string(),
                season,
            })
    }

    /// Rank every other row by similarity to the resolved row.
    ///
    /// Ties keep row order. The resolved row itself is never returned;
    /// other stints of the same player are.
    pub fn find_similar(
        &self,
        player_name: &str,
        season: i32,
        top_n: usize,
    ) -> Result<Vec<SimilarPlayer>, QueryError> {
        if top_n == 0 {
            return Err(QueryError::InvalidTopN);
        }
        let target = self.resolve(player_name, season)?;
        let scores = self.similarity.row(target);

        let mut ranked: Vec<usize> = (0..self.records.len()).filter(|&i| i != target).collect();
        // Stable sort keeps row order among equal scores.
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        ranked.truncate(top_n);

        debug!(
            "{} ({}): {} comparables returned",
            player_name,
            season,
            ranked.len()
        );

        Ok(ranked
            .into_iter()
            .map(|i| {
                let record = &self.records[i];
                SimilarPlayer {
                    player_name: record.player.clone(),
                    season: record.season,
                    team: record.tm.clone(),
                    similarity: scores[i],
                }
            })
            .collect())
    }

    /// Every stint for a player in a season, matched case-insensitively.
    pub fn stat_lines(&self, player_name: &str, season: i32) -> Result<Vec<StatLine>, QueryError> {
        let wanted = player_name.to_lowercase();
        let lines: Vec<StatLine> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.season == season && r.player.to_lowercase() == wanted)
            .map(|(row, r)| StatLine {
                identity: r.clone(),
                stats: self
                    .feature_names
                    .iter()
                    .zip(self.raw.row(row).iter())
                    .map(|(stat, &value)| StatValue {
                        stat: stat.clone(),
                        value,
                    })
                    .collect(),
            })
            .collect();

        if lines.is_empty() {
            return Err(QueryError::NotFound {
                player_name: player_name.to_string(),
                season,
            });
        }
        Ok(lines)
    }

    /// Distinct player names, sorted.
    pub fn players(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.player.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct player names with a row in `season`, sorted.
    pub fn players_in(&self, season: i32) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.season == season)
            .map(|r| r.player.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Seasons with at least one row for `player_name`, ascending.
    pub fn seasons_for(&self, player_name: &str) -> Vec<i32> {
        self.records
            .iter()
            .filter(|r| r.player == player_name)
            .map(|r| r.season)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn records(&self) -> &[SeasonIdentity] {
        &self.records
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn summary(&self) -> &IndexSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
