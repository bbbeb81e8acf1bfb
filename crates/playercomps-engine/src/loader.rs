// Season table loading and the left join with shooting splits.
//
// The primary table is one row per season-stint (seas_id) with identity
// columns plus an open set of stat columns. An optional secondary table keyed
// by seas_id contributes extra stat columns.

use crate::error::BuildError;
use playercomps_core::SeasonRange;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Identity and metadata columns. Never used as similarity features.
pub const IDENTITY_COLUMNS: [&str; 9] = [
    "seas_id",
    "season",
    "player_id",
    "player",
    "pos",
    "age",
    "experience",
    "lg",
    "tm",
];

/// Column the secondary table is joined on.
pub const JOIN_KEY: &str = "seas_id";

/// Cell tokens read as "no value". The usual spellings written by
/// spreadsheet and dataframe exports.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Who and when a row describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonIdentity {
    pub seas_id: i64,
    pub season: i32,
    pub player_id: String,
    pub player: String,
    pub pos: String,
    pub age: Option<f64>,
    pub experience: Option<i32>,
    pub lg: String,
    pub tm: String,
}

/// A parsed stat cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Non-finite numbers are treated as missing so they never reach the
    /// feature matrix.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if MISSING_TOKENS.contains(&raw) {
            return Cell::Missing;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            Ok(_) => Cell::Missing,
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// A CSV file read as strings: header row plus data rows of equal width.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// The unified season table: identities, stat column names, and one row of
/// stat cells per identity. Row `i` of `cells` belongs to `identities[i]`.
#[derive(Debug, Clone)]
pub struct SeasonTable {
    pub identities: Vec<SeasonIdentity>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Cell>>,
}

impl SeasonTable {
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Row and column selection applied while loading.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Applied to the primary table before the join.
    pub season_filter: SeasonRange,
    /// Dropped from both tables when present.
    pub drop_columns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

impl RawTable {
    /// Read a CSV with a header row. Rows with the wrong number of fields
    /// are skipped.
    pub fn from_reader<R: Read>(name: impl Into<String>, rdr: R) -> Result<Self, BuildError> {
        let name = name.into();
        let mut reader = csv::Reader::from_reader(rdr);
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| BuildError::Csv {
                source_name: name.clone(),
                source: e,
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            match result {
                Ok(record) => rows.push(record.iter().map(|f| f.trim().to_string()).collect()),
                Err(e) => warn!("skipping malformed row in {}: {}", name, e),
            }
        }

        debug!("read {} rows x {} columns from {}", rows.len(), headers.len(), name);
        Ok(Self {
            name,
            headers,
            rows,
        })
    }

    /// Read a CSV file from disk.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let file = std::fs::File::open(path).map_err(|e| BuildError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_reader(path.display().to_string(), file)
    }

    /// Position of the first header with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Stat columns of `table` that survive the drop list, the identity list,
/// `exclude`, and first-occurrence de-duplication, as `(name, position)`.
fn stat_columns(
    table: &RawTable,
    drop_columns: &[String],
    exclude: &HashSet<String>,
) -> Vec<(String, usize)> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for (idx, header) in table.headers.iter().enumerate() {
        if IDENTITY_COLUMNS.contains(&header.as_str()) {
            continue;
        }
        if drop_columns.iter().any(|d| d == header) {
            debug!("dropping column `{}` from {}", header, table.name);
            continue;
        }
        if exclude.contains(header) {
            debug!("column `{}` in {} already loaded, skipping", header, table.name);
            continue;
        }
        if !seen.insert(header.clone()) {
            debug!("duplicate column `{}` in {}, keeping first", header, table.name);
            continue;
        }
        columns.push((header.clone(), idx));
    }
    columns
}

fn parse_identity(positions: &[usize; 9], row: &[String]) -> Result<SeasonIdentity, String> {
    let field = |i: usize| row[positions[i]].as_str();
    let seas_id = field(0)
        .parse::<i64>()
        .map_err(|_| format!("invalid seas_id `{}`", field(0)))?;
    let season = field(1)
        .parse::<i32>()
        .map_err(|_| format!("invalid season `{}`", field(1)))?;
    Ok(SeasonIdentity {
        seas_id,
        season,
        player_id: field(2).to_string(),
        player: field(3).to_string(),
        pos: field(4).to_string(),
        age: Cell::parse(field(5)).as_number(),
        experience: field(6).parse::<i32>().ok(),
        lg: field(7).to_string(),
        tm: field(8).to_string(),
    })
}

/// Build the unified season table.
///
/// Primary rows are kept in file order, filtered by season, and never
/// dropped by the join. Secondary columns that are identity columns,
/// dropped, or already present in the primary table are discarded.
/// Primary rows without a secondary match get `Cell::Missing` for every
/// secondary column.
pub fn load_season_table(
    primary: &RawTable,
    secondary: Option<&RawTable>,
    options: &LoadOptions,
) -> Result<SeasonTable, BuildError> {
    // ---- identity columns ----
    let missing: Vec<String> = IDENTITY_COLUMNS
        .iter()
        .filter(|c| primary.column_index(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(BuildError::DataLoad {
            source_name: primary.name.clone(),
            missing,
        });
    }
    let mut positions = [0usize; 9];
    for (slot, name) in positions.iter_mut().zip(IDENTITY_COLUMNS.iter()) {
        *slot = primary.column_index(name).unwrap_or_default();
    }

    // The join key is checked before any row work so a bad secondary table
    // fails fast.
    let secondary_key = match secondary {
        Some(table) => Some(table.column_index(JOIN_KEY).ok_or_else(|| BuildError::Schema {
            source_name: table.name.clone(),
            key: JOIN_KEY.to_string(),
        })?),
        None => None,
    };

    // ---- primary rows ----
    let primary_columns = stat_columns(primary, &options.drop_columns, &HashSet::new());
    let mut identities = Vec::with_capacity(primary.rows.len());
    let mut cells: Vec<Vec<Cell>> = Vec::with_capacity(primary.rows.len());
    let mut filtered_out = 0usize;

    for (line, row) in primary.rows.iter().enumerate() {
        let identity = match parse_identity(&positions, row) {
            Ok(identity) => identity,
            Err(reason) => {
                warn!("skipping row {} of {}: {}", line + 1, primary.name, reason);
                continue;
            }
        };
        if !options.season_filter.contains(identity.season) {
            filtered_out += 1;
            continue;
        }
        cells.push(
            primary_columns
                .iter()
                .map(|(_, idx)| Cell::parse(&row[*idx]))
                .collect(),
        );
        identities.push(identity);
    }

    if !options.season_filter.is_unbounded() {
        debug!("season filter {:?} removed {} rows", options.season_filter, filtered_out);
    }
    if identities.is_empty() {
        return Err(BuildError::EmptyDataset {
            source_name: primary.name.clone(),
        });
    }

    let mut columns: Vec<String> = primary_columns.iter().map(|(n, _)| n.clone()).collect();

    // ---- left join ----
    if let (Some(table), Some(key_idx)) = (secondary, secondary_key) {
        let already: HashSet<String> = columns.iter().cloned().collect();
        let joined_columns = stat_columns(table, &options.drop_columns, &already);

        let mut by_key: HashMap<i64, usize> = HashMap::with_capacity(table.rows.len());
        for (line, row) in table.rows.iter().enumerate() {
            let Ok(key) = row[key_idx].parse::<i64>() else {
                warn!(
                    "skipping row {} of {}: invalid {} `{}`",
                    line + 1,
                    table.name,
                    JOIN_KEY,
                    row[key_idx]
                );
                continue;
            };
            if by_key.contains_key(&key) {
                warn!("duplicate {} {} in {}, using first row", JOIN_KEY, key, table.name);
                continue;
            }
            by_key.insert(key, line);
        }

        let mut matched = 0usize;
        for (identity, row_cells) in identities.iter().zip(cells.iter_mut()) {
            match by_key.get(&identity.seas_id) {
                Some(&line) => {
                    matched += 1;
                    let row = &table.rows[line];
                    row_cells.extend(joined_columns.iter().map(|(_, idx)| Cell::parse(&row[*idx])));
                }
                None => {
                    row_cells.extend(std::iter::repeat(Cell::Missing).take(joined_columns.len()));
                }
            }
        }

        info!(
            "joined {} columns from {}: {}/{} rows matched",
            joined_columns.len(),
            table.name,
            matched,
            identities.len()
        );
        columns.extend(joined_columns.into_iter().map(|(n, _)| n));
    }

    info!(
        "loaded {} season rows with {} stat columns from {}",
        identities.len(),
        columns.len(),
        primary.name
    );

    Ok(SeasonTable {
        identities,
        columns,
        cells,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
