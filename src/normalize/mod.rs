//! Record normalization: nested document -> flat row
//!
//! Combines path extraction, per-column type coercion, the seconds-vs-
//! milliseconds epoch heuristic, and the derived date-time columns into one
//! row per detail document. Normalization anomalies (missing fields,
//! unparseable timestamps) resolve to null cells and never abort a crawl.

use crate::config::MappingEntry;
use crate::extract::{extract, render_scalar};
use crate::schema::{
    ColumnType, InferredSchema, IDENTITY_COLUMN, POST_DATE_COLUMN, TIMESTAMP_COLUMN,
};
use chrono::{FixedOffset, TimeZone, Utc};
use rusqlite::types::{ToSqlOutput, Value as SqlValue};
use rusqlite::ToSql;
use serde_json::Value;

/// Column name conventionally holding the raw Unix timestamp
pub const UNIX_TIMESTAMP_COLUMN: &str = "unix_timestamp";

/// Raw values above this magnitude are millisecond-epoch, not second-epoch
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Civil calendar offset for derived date-time columns (UTC+7)
const UTC_OFFSET_SECONDS: i32 = 7 * 3600;

/// One cell of a flat row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Self::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            Self::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(*b as i64)),
            Self::Text(s) => ToSqlOutput::Owned(SqlValue::Text(s.clone())),
            Self::Null => ToSqlOutput::Owned(SqlValue::Null),
        })
    }
}

/// One flat row, columns in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    /// The identity value of this row
    pub fn id(&self) -> i64 {
        match self.get(IDENTITY_COLUMN) {
            Some(CellValue::Integer(id)) => *id,
            _ => 0,
        }
    }

    /// Looks up a cell by column name
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    /// Ordered `(column, cell)` pairs
    pub fn cells(&self) -> &[(String, CellValue)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Normalizes one detail document into a flat row
///
/// The identity column prefers the document's own `ad.list_id` over the
/// identifier used to fetch it, guarding against a gateway returning a
/// canonical id that differs from the requested one. Every schema column is
/// present in the result; anything unresolvable is a null cell.
pub fn normalize(
    doc: &Value,
    ad_id: u64,
    mapping: &[MappingEntry],
    schema: &InferredSchema,
) -> Row {
    let identity = extract(doc, "ad.list_id")
        .and_then(|v| v.as_i64())
        .unwrap_or(ad_id as i64);

    let mut cells = vec![(IDENTITY_COLUMN.to_string(), CellValue::Integer(identity))];

    for entry in mapping {
        if entry.column == IDENTITY_COLUMN {
            continue;
        }
        let column_type = schema
            .column_type(&entry.column)
            .unwrap_or(ColumnType::Text);
        let cell = match extract(doc, &entry.path) {
            Some(value) => coerce(&value, column_type),
            None => CellValue::Null,
        };
        cells.push((entry.column.clone(), cell));
    }

    // Epoch heuristic: reinterpret the raw unix_timestamp cell as seconds,
    // floor-dividing millisecond-scale values by 1000.
    let epoch_seconds = cells
        .iter()
        .find(|(name, _)| name == UNIX_TIMESTAMP_COLUMN)
        .and_then(|(_, cell)| parse_epoch(cell));
    if let Some((_, cell)) = cells
        .iter_mut()
        .find(|(name, _)| name == UNIX_TIMESTAMP_COLUMN)
    {
        *cell = match epoch_seconds {
            Some(secs) => {
                let ty = schema
                    .column_type(UNIX_TIMESTAMP_COLUMN)
                    .unwrap_or(ColumnType::Text);
                coerce(&Value::from(secs), ty)
            }
            None => CellValue::Null,
        };
    }

    let (timestamp, post_date) = derive_datetime(epoch_seconds);
    let mapped: Vec<&str> = mapping.iter().map(|m| m.column.as_str()).collect();
    if !mapped.contains(&TIMESTAMP_COLUMN) {
        cells.push((TIMESTAMP_COLUMN.to_string(), timestamp));
    }
    if !mapped.contains(&POST_DATE_COLUMN) {
        cells.push((POST_DATE_COLUMN.to_string(), post_date));
    }

    Row { cells }
}

/// Coerces an extracted JSON value into a cell of the given storage type
///
/// Coercion is lenient: numeric strings parse, anything else degrades to
/// null rather than erroring.
fn coerce(value: &Value, column_type: ColumnType) -> CellValue {
    match column_type {
        ColumnType::Integer => value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .map(CellValue::Integer)
            .unwrap_or(CellValue::Null),
        ColumnType::Double => value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .map(CellValue::Real)
            .unwrap_or(CellValue::Null),
        ColumnType::Boolean => match value {
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => CellValue::Bool(false),
                Some(_) => CellValue::Bool(true),
                None => CellValue::Null,
            },
            _ => CellValue::Null,
        },
        ColumnType::Text | ColumnType::Timestamp | ColumnType::Date => {
            CellValue::Text(render_scalar(value))
        }
    }
}

/// Parses the raw epoch cell and applies the magnitude heuristic
fn parse_epoch(cell: &CellValue) -> Option<i64> {
    let raw = match cell {
        CellValue::Integer(i) => *i,
        CellValue::Real(r) => *r as i64,
        CellValue::Text(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    if raw > MILLIS_THRESHOLD {
        Some(raw / 1000)
    } else {
        Some(raw)
    }
}

/// Derives the `timestamp` and `post_date` cells from epoch seconds
///
/// Both render in the fixed UTC+7 civil calendar; an unresolvable epoch
/// yields null for both.
fn derive_datetime(epoch_seconds: Option<i64>) -> (CellValue, CellValue) {
    let Some(secs) = epoch_seconds else {
        return (CellValue::Null, CellValue::Null);
    };
    let Some(offset) = FixedOffset::east_opt(UTC_OFFSET_SECONDS) else {
        return (CellValue::Null, CellValue::Null);
    };
    match Utc.timestamp_opt(secs, 0).single() {
        Some(dt) => {
            let local = dt.with_timezone(&offset);
            (
                CellValue::Text(local.format("%Y-%m-%d %H:%M:%S").to_string()),
                CellValue::Text(local.format("%Y-%m-%d").to_string()),
            )
        }
        None => (CellValue::Null, CellValue::Null),
    }
}
