//! Frame: the in-memory ratings table graphs are built from.
//!
//! ```text
//!  from_id | to_id | score | label?  | <prop>_score ...
//!  u1      | Tenet | 0.6   | watched | 0.8
//! ```
//!
//! A frame is untyped: any column may hold any [`Value`]. Graph population
//! first runs [`Frame::rating_rows`], which checks the required columns and
//! converts every row into a typed [`RatingRow`] before the graph is touched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Value;
use crate::{Error, Result};

pub const FROM_ID: &str = "from_id";
pub const TO_ID: &str = "to_id";
pub const SCORE: &str = "score";
pub const LABEL: &str = "label";

/// Columns every ratings frame must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = [FROM_ID, TO_ID, SCORE];

/// A table of named columns and rows of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    /// Build a frame, checking that every row matches the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(Error::Validation(format!(
                "row {idx} has {} cells but the frame has {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Build a frame from rows the caller produced at the header width.
    pub(crate) fn from_rows_unchecked(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// Build a frame from columns of equal length, like `DataFrame.from_dict`.
    pub fn from_columns<K, V>(columns: Vec<(K, Vec<V>)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let len = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut names = Vec::with_capacity(columns.len());
        let mut cells: Vec<std::vec::IntoIter<V>> = Vec::with_capacity(columns.len());
        for (name, col) in columns {
            let name = name.into();
            if col.len() != len {
                return Err(Error::Validation(format!(
                    "column '{name}' has {} values, expected {len}",
                    col.len()
                )));
            }
            names.push(name);
            cells.push(col.into_iter());
        }

        let mut rows = Vec::with_capacity(len);
        for _ in 0..len {
            rows.push(cells.iter_mut().filter_map(|c| c.next()).map(Into::into).collect());
        }
        Self::new(names, rows)
    }

    /// Parse a JSON array of flat objects, one object per row.
    ///
    /// Columns appear in first-seen order; keys a record lacks become `Null`.
    pub fn from_json_records(json: &str) -> Result<Self> {
        let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(json)?;

        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|c| record.remove(c).map(Value::from).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { frame: self, cells: cells.as_slice() })
    }

    /// Names of the required columns this frame lacks.
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Validate the frame and convert every row into a [`RatingRow`].
    ///
    /// Fails without partial output if a required column is absent, a
    /// `score` cell is not numeric, or a score or `<label>_score` cell is
    /// not finite.
    pub fn rating_rows(&self) -> Result<Vec<RatingRow>> {
        let missing = self.missing_columns();
        if !missing.is_empty() {
            return Err(Error::MissingColumns { missing });
        }
        self.rows()
            .enumerate()
            .map(|(idx, row)| RatingRow::from_row(idx, &row))
            .collect()
    }
}

/// Borrowed view over one frame row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    frame: &'a Frame,
    cells: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.frame.column_index(column).map(|i| &self.cells[i])
    }

    pub fn cells(&self) -> &'a [Value] {
        self.cells
    }
}

/// Typed view of a ratings row.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRow {
    pub from_id: Value,
    pub to_id: Value,
    pub score: f64,
    pub label: Option<String>,
    /// Numeric `<name>_score` columns, keyed by column name.
    pub preferences: HashMap<String, f64>,
}

impl RatingRow {
    fn from_row(idx: usize, row: &Row<'_>) -> Result<Self> {
        // Column presence was checked by the caller.
        let cell = |name: &str| row.get(name).cloned().unwrap_or(Value::Null);

        let score = cell(SCORE).as_float().ok_or_else(|| {
            Error::Validation(format!(
                "row {idx}: score must be numeric, got {}",
                cell(SCORE).type_name()
            ))
        })?;
        if !score.is_finite() {
            return Err(Error::Validation(format!("row {idx}: score must be finite, got {score}")));
        }

        let label = match row.get(LABEL) {
            Some(Value::Null) | None => None,
            Some(v) => Some(v.to_string()),
        };

        let mut preferences = HashMap::new();
        for (name, v) in row.frame.columns().iter().zip(row.cells()) {
            if !name.ends_with("_score") {
                continue;
            }
            let Some(f) = v.as_float() else { continue };
            if !f.is_finite() {
                return Err(Error::Validation(format!("row {idx}: {name} must be finite, got {f}")));
            }
            preferences.insert(name.clone(), f);
        }

        Ok(Self {
            from_id: cell(FROM_ID),
            to_id: cell(TO_ID),
            score,
            label,
            preferences,
        })
    }

    /// Preference for a property label: the `"{label_lowercase}_score"`
    /// column when present, otherwise `None`.
    pub fn preference(&self, label: &str) -> Option<f64> {
        self.preferences.get(&format!("{}_score", label.to_lowercase())).copied()
    }
}
