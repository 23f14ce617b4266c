//! Record Store - Client feature table keyed by SK_ID_CURR
//!
//! Loaded once from the dataset artifact and never mutated afterwards.
//! The identifier and label columns are split off at load time, so every
//! `ClientRecord` carries only the feature columns, in file order.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::error::ScoringError;

/// Identifier column
pub const ID_COLUMN: &str = "SK_ID_CURR";

/// Label column, never fed to the model
pub const LABEL_COLUMN: &str = "TARGET";

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// What `lookup` does when an identifier appears on several rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// First row in file order wins
    #[default]
    FirstMatch,
    /// Fail with `AmbiguousRecord`
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" | "first_match" => Ok(Self::FirstMatch),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown duplicate policy '{}'", other)),
        }
    }
}

/// Dataset artifact as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetFile {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// One client row, immutable once stored
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
    pub id: i64,
    pub label: Option<f64>,
    /// Raw feature values; `None` is a missing value
    pub values: Vec<Option<f64>>,
    columns: Arc<[String]>,
}

impl ClientRecord {
    pub fn new(id: i64, label: Option<f64>, values: Vec<Option<f64>>, columns: Arc<[String]>) -> Self {
        Self { id, label, values, columns }
    }

    /// Feature column names, index-aligned with `values`
    pub fn feature_names(&self) -> &[String] {
        &self.columns
    }
}

pub struct RecordStore {
    columns: Arc<[String]>,
    records: Vec<ClientRecord>,
    index: HashMap<i64, Vec<usize>>,
    policy: DuplicatePolicy,
}

// ============================================================================
// LOADING
// ============================================================================

impl RecordStore {
    /// Build the store from a parsed dataset artifact
    pub fn from_dataset(dataset: DatasetFile, policy: DuplicatePolicy) -> Result<Self, ScoringError> {
        let id_pos = single_column(&dataset.columns, ID_COLUMN)?
            .ok_or_else(|| corrupt(format!("missing identifier column {}", ID_COLUMN)))?;
        let label_pos = single_column(&dataset.columns, LABEL_COLUMN)?;

        let columns: Arc<[String]> = dataset.columns.iter()
            .enumerate()
            .filter(|(i, _)| *i != id_pos && Some(*i) != label_pos)
            .map(|(_, name)| name.clone())
            .collect();

        let mut records = Vec::with_capacity(dataset.rows.len());
        let mut index: HashMap<i64, Vec<usize>> = HashMap::with_capacity(dataset.rows.len());

        for (row_num, row) in dataset.rows.iter().enumerate() {
            if row.len() != dataset.columns.len() {
                return Err(corrupt(format!(
                    "row {} has {} cells, expected {}",
                    row_num, row.len(), dataset.columns.len()
                )));
            }

            let id = parse_identifier(&row[id_pos])
                .ok_or_else(|| corrupt(format!("row {} has invalid {}: {}", row_num, ID_COLUMN, row[id_pos])))?;

            let label = match label_pos {
                Some(pos) => parse_cell(&row[pos])
                    .map_err(|e| corrupt(format!("row {} {}: {}", row_num, LABEL_COLUMN, e)))?,
                None => None,
            };

            let mut values = Vec::with_capacity(columns.len());
            for (col, cell) in row.iter().enumerate() {
                if col == id_pos || Some(col) == label_pos {
                    continue;
                }
                let value = parse_cell(cell)
                    .map_err(|e| corrupt(format!("row {} column {}: {}", row_num, dataset.columns[col], e)))?;
                values.push(value);
            }

            index.entry(id).or_default().push(records.len());
            records.push(ClientRecord::new(id, label, values, columns.clone()));
        }

        let store = Self { columns, records, index, policy };

        let duplicates = store.duplicate_count();
        if duplicates > 0 {
            tracing::warn!(
                "Dataset has {} duplicated {} values (policy: {:?})",
                duplicates, ID_COLUMN, policy
            );
        }

        Ok(store)
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    pub fn lookup(&self, id: i64) -> Result<&ClientRecord, ScoringError> {
        let positions = self.index.get(&id).ok_or(ScoringError::NotFound(id))?;

        if positions.len() > 1 && self.policy == DuplicatePolicy::Reject {
            return Err(ScoringError::AmbiguousRecord { id, count: positions.len() });
        }

        positions.first()
            .map(|&pos| &self.records[pos])
            .ok_or(ScoringError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature columns in dataset order
    pub fn feature_names(&self) -> &[String] {
        &self.columns
    }

    /// Number of identifiers that appear on more than one row
    pub fn duplicate_count(&self) -> usize {
        self.index.values().filter(|rows| rows.len() > 1).count()
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn corrupt(msg: String) -> ScoringError {
    ScoringError::ModelNotLoaded(format!("dataset: {}", msg))
}

fn single_column(columns: &[String], name: &str) -> Result<Option<usize>, ScoringError> {
    let mut found = columns.iter().enumerate().filter(|(_, c)| c.as_str() == name);
    let first = found.next().map(|(i, _)| i);
    if found.next().is_some() {
        return Err(corrupt(format!("column {} appears more than once", name)));
    }
    Ok(first)
}

/// Identifiers may be written as 100002 or 100002.0
fn parse_identifier(cell: &Value) -> Option<i64> {
    if let Some(id) = cell.as_i64() {
        return Some(id);
    }
    let f = cell.as_f64()?;
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn parse_cell(cell: &Value) -> Result<Option<f64>, String> {
    match cell {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::Number(n) => n.as_f64()
            .map(Some)
            .ok_or_else(|| format!("unrepresentable number {}", n)),
        other => Err(format!("non-numeric value {}", other)),
    }
}
