// Integration tests for the similarity index.
//
// These build indexes from the CSV fixtures through the public API and check
// the ranking properties callers rely on: self-exclusion, ordering, result
// counts, symmetry, determinism, and the error taxonomy.

use std::path::Path;

use playercomps_core::{SeasonRange, WeightTable};
use playercomps_engine::{
    build_index, build_index_from_paths, find_similar, BuildError, IndexOptions, QueryError,
    RawTable, SimilarityIndex,
};

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the package root, which is the cwd
/// for `cargo test`).
const FIXTURES: &str = "tests/fixtures";

fn shooting_options() -> IndexOptions {
    IndexOptions::builtin("shooting").expect("shooting profile exists")
}

fn per_100_index() -> SimilarityIndex {
    let primary = Path::new(FIXTURES).join("per_100.csv");
    build_index_from_paths(&primary, None, &shooting_options()).expect("fixture index builds")
}

fn shooting_index() -> SimilarityIndex {
    let primary = Path::new(FIXTURES).join("per_100.csv");
    let secondary = Path::new(FIXTURES).join("shooting.csv");
    let options = shooting_options().with_season_filter(SeasonRange::starting(1997));
    build_index_from_paths(&primary, Some(&secondary), &options).expect("fixture index builds")
}

fn inline_index(csv: &str) -> SimilarityIndex {
    weighted_inline_index(csv, WeightTable::default())
}

fn weighted_inline_index(csv: &str, weights: WeightTable) -> SimilarityIndex {
    let primary = RawTable::from_reader("inline", csv.as_bytes()).unwrap();
    build_index(&primary, None, &IndexOptions::new(weights)).unwrap()
}

// ===========================================================================
// Matrix properties
// ===========================================================================

#[test]
fn diagonal_is_one_for_non_zero_rows() {
    let index = shooting_index();
    let matrix = index.similarity();
    for i in 0..matrix.len() {
        assert!((matrix.get(i, i) - 1.0).abs() < 1e-9, "row {i}");
    }
}

#[test]
fn matrix_is_symmetric() {
    let index = shooting_index();
    let matrix = index.similarity();
    for i in 0..matrix.len() {
        for j in 0..matrix.len() {
            assert!((matrix.get(i, j) - matrix.get(j, i)).abs() < 1e-9);
        }
    }
}

#[test]
fn null_stats_do_not_produce_nan() {
    // DeAndre Jordan and Rudy Gobert have NA three-point percentages, and
    // 2017 Chris Paul has no shooting row at all.
    let index = shooting_index();
    assert!(index.summary().filled_cells > 0);
    let matrix = index.similarity();
    for i in 0..matrix.len() {
        assert!(matrix.row(i).iter().all(|v| v.is_finite()));
    }
}

#[test]
fn constant_columns_do_not_produce_nan() {
    let index = inline_index(
        "\
seas_id,season,player_id,player,pos,age,experience,lg,tm,g,pts,ast
1,2020,1,A,G,25,3,NBA,AAA,82,30.0,5.0
2,2020,2,B,G,25,3,NBA,BBB,82,10.0,9.0
3,2020,3,C,G,25,3,NBA,CCC,82,20.0,1.0",
    );
    let matrix = index.similarity();
    for i in 0..matrix.len() {
        assert!(matrix.row(i).iter().all(|v| v.is_finite()));
    }
}

// ===========================================================================
// Query properties
// ===========================================================================

#[test]
fn results_never_include_the_query_row() {
    let index = per_100_index();
    for record in index.records() {
        let results = index.find_similar(&record.player, record.season, 50).unwrap();
        let target = index.resolve(&record.player, record.season).unwrap();
        let target_record = &index.records()[target];
        assert!(!results.iter().any(|r| r.player_name == target_record.player
            && r.season == target_record.season
            && r.team == target_record.tm));
    }
}

#[test]
fn result_count_is_min_of_top_n_and_others() {
    let index = per_100_index();
    let n = index.len();
    for k in [1, 3, n - 1, n, n + 5] {
        let results = find_similar(&index, "Stephen Curry", 2016, k).unwrap();
        assert_eq!(results.len(), k.min(n - 1), "top_n = {k}");
    }
}

#[test]
fn results_are_sorted_descending() {
    let index = shooting_index();
    let results = index.find_similar("Kyle Korver", 2017, 20).unwrap();
    for pair in results.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[test]
fn building_twice_gives_identical_answers() {
    let first = shooting_index();
    let second = shooting_index();
    assert_eq!(first.feature_names(), second.feature_names());
    for record in first.records() {
        assert_eq!(
            first.find_similar(&record.player, record.season, 10),
            second.find_similar(&record.player, record.season, 10)
        );
    }
}

#[test]
fn similar_styles_rank_together() {
    let index = shooting_index();
    let results = index.find_similar("DeAndre Jordan", 2016, 2).unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.player_name.as_str()).collect();
    assert!(names.contains(&"Rudy Gobert"));
    assert!(names.contains(&"Andre Drummond"));
}

#[test]
fn identical_rows_rank_each_other_first() {
    let index = inline_index(
        "\
seas_id,season,player_id,player,pos,age,experience,lg,tm,pts,ast,trb
1,2023,1,Twin One,SF,26,4,NBA,AAA,25.0,5.0,8.0
2,2023,2,Other,C,30,9,NBA,BBB,12.0,2.0,20.0
3,2023,3,Twin Two,SF,27,5,NBA,CCC,25.0,5.0,8.0
4,2023,4,Guard,PG,22,1,NBA,DDD,18.0,11.0,4.0",
    );

    let one = index.find_similar("Twin One", 2023, 3).unwrap();
    assert_eq!(one[0].player_name, "Twin Two");
    assert!((one[0].similarity - 1.0).abs() < 1e-9);

    let two = index.find_similar("Twin Two", 2023, 3).unwrap();
    assert_eq!(two[0].player_name, "Twin One");
    assert!((two[0].similarity - 1.0).abs() < 1e-9);
}

#[test]
fn unknown_player_is_not_found_with_context() {
    let index = per_100_index();
    let err = find_similar(&index, "Nonexistent Player", 2023, 10).unwrap_err();
    assert_eq!(
        err,
        QueryError::NotFound {
            player_name: "Nonexistent Player".into(),
            season: 2023,
        }
    );
    assert_eq!(err.to_string(), "no data for Nonexistent Player in 2023");

    // The index is still usable afterwards.
    assert!(index.find_similar("Chris Paul", 2016, 3).is_ok());
}

#[test]
fn top_n_beyond_population_returns_everyone_else() {
    let index = per_100_index();
    let results = index.find_similar("Rudy Gobert", 2016, 1000).unwrap();
    assert_eq!(results.len(), index.len() - 1);
}

#[test]
fn ties_keep_row_order() {
    // Every row is all zeros after scaling, so every similarity is 0.
    let index = inline_index(
        "\
seas_id,season,player_id,player,pos,age,experience,lg,tm,pts
1,2020,1,First,G,25,3,NBA,AAA,10.0
2,2020,2,Second,G,25,3,NBA,BBB,10.0
3,2020,3,Third,G,25,3,NBA,CCC,10.0
4,2020,4,Fourth,G,25,3,NBA,DDD,10.0",
    );
    let results = index.find_similar("Third", 2020, 3).unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.player_name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second", "Fourth"]);
    assert!(results.iter().all(|r| r.similarity == 0.0));
}

// ===========================================================================
// Weighting
// ===========================================================================

// pts = [0, 1, 2] and ast = [1, 2, 0] both standardize to multiples of
// k = sqrt(3/2): A = (-k, 0), B = (0, k), C = (k, -k). Tripling pts gives
// A = (-3k, 0), C = (3k, -k), so cos(C, B) = -1/sqrt(10) and
// cos(C, A) = -3/sqrt(10). Unweighted, both are -1/sqrt(2).
const TWO_STATS: &str = "\
seas_id,season,player_id,player,pos,age,experience,lg,tm,pts,ast
1,2020,1,A,G,25,3,NBA,AAA,0.0,1.0
2,2020,2,B,G,25,3,NBA,BBB,1.0,2.0
3,2020,3,C,G,25,3,NBA,CCC,2.0,0.0";

#[test]
fn unweighted_similarities_match_hand_calculation() {
    let index = inline_index(TWO_STATS);
    let results = index.find_similar("C", 2020, 2).unwrap();
    let expected = -1.0 / 2f64.sqrt();
    // Equal scores keep row order.
    assert_eq!(results[0].player_name, "A");
    assert_eq!(results[1].player_name, "B");
    assert!((results[0].similarity - expected).abs() < 1e-9);
    assert!((results[1].similarity - expected).abs() < 1e-9);
}

#[test]
fn weight_table_changes_scores_and_ranking() {
    let index = weighted_inline_index(TWO_STATS, WeightTable::from_pairs([("pts", 3.0)]));
    let results = index.find_similar("C", 2020, 2).unwrap();
    assert_eq!(results[0].player_name, "B");
    assert_eq!(results[1].player_name, "A");
    assert!((results[0].similarity - (-1.0 / 10f64.sqrt())).abs() < 1e-9);
    assert!((results[1].similarity - (-3.0 / 10f64.sqrt())).abs() < 1e-9);

    // A and B share no non-zero component either way.
    assert!(index.similarity().get(0, 1).abs() < 1e-9);
}

// ===========================================================================
// Loading and joining
// ===========================================================================

#[test]
fn season_filter_and_join_shape_the_index() {
    let index = shooting_index();
    // Jordan's 1996 row is filtered before the join.
    assert!(index.seasons_for("Michael Jordan").is_empty());
    assert_eq!(index.len(), 11);
    assert!(index.feature_names().iter().any(|f| f == "avg_dist_fga"));
    assert!(!index.feature_names().iter().any(|f| f == "birth_year"));
    assert_eq!(
        index
            .feature_names()
            .iter()
            .filter(|f| f.as_str() == "fg_percent")
            .count(),
        1
    );
    assert_eq!(index.seasons_for("Stephen Curry"), vec![2016, 2017]);
}

#[test]
fn unmatched_join_rows_read_as_zero() {
    let index = shooting_index();
    let lines = index.stat_lines("Chris Paul", 2017).unwrap();
    let avg_dist = lines[0]
        .stats
        .iter()
        .find(|s| s.stat == "avg_dist_fga")
        .unwrap();
    assert_eq!(avg_dist.value, 0.0);
}

#[test]
fn missing_identity_columns_abort_construction() {
    let primary = RawTable::from_reader("bad", "player,season,pts\nX,2020,1.0".as_bytes()).unwrap();
    let err = build_index(&primary, None, &IndexOptions::new(WeightTable::default())).unwrap_err();
    assert!(matches!(err, BuildError::DataLoad { .. }));
}

#[test]
fn secondary_without_join_key_aborts_construction() {
    let primary = RawTable::load(&Path::new(FIXTURES).join("per_100.csv")).unwrap();
    let secondary =
        RawTable::from_reader("no_key", "player,avg_dist_fga\nX,9.9".as_bytes()).unwrap();
    let err = build_index(
        &primary,
        Some(&secondary),
        &IndexOptions::new(WeightTable::default()),
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::Schema { .. }));
}

#[test]
fn missing_file_is_io_error() {
    let err = build_index_from_paths(
        Path::new("tests/fixtures/does_not_exist.csv"),
        None,
        &IndexOptions::new(WeightTable::default()),
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::Io { .. }));
}
