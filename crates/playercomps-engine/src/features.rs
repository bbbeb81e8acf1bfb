// Feature matrix assembly: numeric column selection and missing-value fill.

use crate::loader::{Cell, SeasonIdentity, SeasonTable};
use ndarray::Array2;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Value substituted for a missing stat. Means "not recorded", which the
/// model cannot tell apart from a true zero.
pub const MISSING_FILL: f64 = 0.0;

/// Identities plus the dense, filled feature matrix. Row `i` of `values`
/// belongs to `identities[i]`; column `j` is `feature_names[j]`.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub identities: Vec<SeasonIdentity>,
    pub feature_names: Vec<String>,
    pub values: Array2<f64>,
    /// Per feature, how many cells were filled with `MISSING_FILL`.
    pub filled: Vec<usize>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn filled_cells(&self) -> usize {
        self.filled.iter().sum()
    }
}

/// Select the numeric feature columns of `table` and fill missing cells.
///
/// A column is numeric when none of its cells is text. Columns named in
/// `identity_columns` and repeated names after the first are skipped.
/// Column order follows `table.columns`; row order is unchanged.
pub fn build_features(table: SeasonTable, identity_columns: &[&str]) -> FeatureTable {
    let mut seen = HashSet::new();
    let mut selected: Vec<usize> = Vec::new();

    for (col, name) in table.columns.iter().enumerate() {
        if identity_columns.contains(&name.as_str()) {
            continue;
        }
        if !seen.insert(name.as_str()) {
            debug!("duplicate feature column `{}`, keeping first", name);
            continue;
        }
        let first_text = table.cells.iter().find_map(|row| match &row[col] {
            Cell::Text(text) => Some(text.as_str()),
            _ => None,
        });
        if let Some(text) = first_text {
            warn!(
                "column `{}` is not numeric (found `{}`), excluded from features",
                name, text
            );
            continue;
        }
        selected.push(col);
    }

    let rows = table.identities.len();
    let mut values = Array2::<f64>::zeros((rows, selected.len()));
    let mut filled = vec![0usize; selected.len()];

    for (i, row) in table.cells.iter().enumerate() {
        for (j, &col) in selected.iter().enumerate() {
            values[(i, j)] = match row[col].as_number() {
                Some(v) => v,
                None => {
                    filled[j] += 1;
                    MISSING_FILL
                }
            };
        }
    }

    let feature_names: Vec<String> = selected
        .iter()
        .map(|&col| table.columns[col].clone())
        .collect();

    info!(
        "built {} x {} feature matrix ({} missing cells filled)",
        rows,
        feature_names.len(),
        filled.iter().sum::<usize>()
    );

    FeatureTable {
        identities: table.identities,
        feature_names,
        values,
        filled,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::IDENTITY_COLUMNS;

    fn identity(seas_id: i64, player: &str) -> SeasonIdentity {
        SeasonIdentity {
            seas_id,
            season: 2001,
            player_id: seas_id.to_string(),
            player: player.into(),
            pos: "G".into(),
            age: Some(25.0),
            experience: Some(3),
            lg: "NBA".into(),
            tm: "LAL".into(),
        }
    }

    fn table(columns: &[&str], cells: Vec<Vec<Cell>>) -> SeasonTable {
        SeasonTable {
            identities: (0..cells.len() as i64)
                .map(|i| identity(i, &format!("Player {i}")))
                .collect(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            cells,
        }
    }

    #[test]
    fn missing_cells_are_filled_with_zero() {
        let t = table(
            &["pts", "ast"],
            vec![
                vec![Cell::Number(20.0), Cell::Missing],
                vec![Cell::Missing, Cell::Number(5.0)],
                vec![Cell::Number(10.0), Cell::Missing],
            ],
        );
        let features = build_features(t, &IDENTITY_COLUMNS);
        assert_eq!(features.feature_names, vec!["pts", "ast"]);
        assert_eq!(features.values[(1, 0)], 0.0);
        assert_eq!(features.values[(0, 1)], 0.0);
        assert_eq!(features.values[(2, 0)], 10.0);
        assert_eq!(features.filled, vec![1, 2]);
        assert_eq!(features.filled_cells(), 3);
        assert!(features.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn text_columns_are_excluded() {
        let t = table(
            &["pts", "award", "ast"],
            vec![
                vec![Cell::Number(20.0), Cell::Text("MVP".into()), Cell::Number(4.0)],
                vec![Cell::Number(15.0), Cell::Missing, Cell::Number(6.0)],
            ],
        );
        let features = build_features(t, &IDENTITY_COLUMNS);
        assert_eq!(features.feature_names, vec!["pts", "ast"]);
        assert_eq!(features.values.ncols(), 2);
        assert_eq!(features.values[(1, 1)], 6.0);
    }

    #[test]
    fn null_markers_keep_the_column_numeric() {
        use crate::loader::{load_season_table, LoadOptions, RawTable};

        let csv = "\
seas_id,season,player_id,player,pos,age,experience,lg,tm,pts,x3p_percent
1,2001,1,Shooter,SG,25,3,NBA,BOS,20.0,0.3
2,2001,2,Big,C,28,6,NBA,LAL,15.0,NULL
3,2001,3,Other Big,C,31,9,NBA,DEN,12.0,None";
        let raw = RawTable::from_reader("per100", csv.as_bytes()).unwrap();
        let table = load_season_table(&raw, None, &LoadOptions::default()).unwrap();
        let features = build_features(table, &IDENTITY_COLUMNS);
        assert_eq!(features.feature_names, vec!["pts", "x3p_percent"]);
        assert_eq!(features.values.column(1).to_vec(), vec![0.3, 0.0, 0.0]);
        assert_eq!(features.filled, vec![0, 2]);
    }

    #[test]
    fn all_missing_column_is_kept_as_zeros() {
        let t = table(
            &["pts", "heaves"],
            vec![
                vec![Cell::Number(20.0), Cell::Missing],
                vec![Cell::Number(15.0), Cell::Missing],
            ],
        );
        let features = build_features(t, &IDENTITY_COLUMNS);
        assert_eq!(features.feature_names, vec!["pts", "heaves"]);
        assert_eq!(features.values.column(1).sum(), 0.0);
    }

    #[test]
    fn duplicate_and_identity_names_are_skipped() {
        let t = table(
            &["pts", "age", "pts", "ast"],
            vec![vec![
                Cell::Number(1.0),
                Cell::Number(30.0),
                Cell::Number(99.0),
                Cell::Number(2.0),
            ]],
        );
        let features = build_features(t, &IDENTITY_COLUMNS);
        assert_eq!(features.feature_names, vec!["pts", "ast"]);
        assert_eq!(features.values[(0, 0)], 1.0);
        assert_eq!(features.values[(0, 1)], 2.0);
    }

    #[test]
    fn row_order_is_preserved() {
        let t = table(
            &["pts"],
            vec![
                vec![Cell::Number(3.0)],
                vec![Cell::Number(1.0)],
                vec![Cell::Number(2.0)],
            ],
        );
        let features = build_features(t, &IDENTITY_COLUMNS);
        let players: Vec<&str> = features
            .identities
            .iter()
            .map(|i| i.player.as_str())
            .collect();
        assert_eq!(players, vec!["Player 0", "Player 1", "Player 2"]);
        assert_eq!(features.values.column(0).to_vec(), vec![3.0, 1.0, 2.0]);
    }
}
