//! Schema derivation from the field mapping
//!
//! The declarative mapping is the single source of truth for both extraction
//! and storage: this module classifies every source path into a storage type
//! and produces the ordered column set of the `ads` table. Inference is a
//! pure function of the mapping, so issuing the derived DDL repeatedly is
//! always safe.

use crate::config::MappingEntry;

/// Name of the identity (primary key) column
pub const IDENTITY_COLUMN: &str = "id";

/// Reserved derived column holding the full date-time
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Reserved derived column holding the date component
pub const POST_DATE_COLUMN: &str = "post_date";

/// Source paths classified as Integer
const INTEGER_PATHS: &[&str] = &["ad.list_id", "ad.rooms", "ad.toilets"];

/// Source paths classified as Double
const DOUBLE_PATHS: &[&str] = &[
    "ad.width",
    "ad.length",
    "ad.price_million_per_m2",
    "ad.price",
    "ad.size",
];

/// Marker substring for Boolean classification
const BOOLEAN_MARKER: &str = "is_main_street";

/// Storage type of one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Double,
    Boolean,
    Text,
    Timestamp,
    Date,
}

impl ColumnType {
    /// SQL type name used in the `CREATE TABLE` statement
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Double => "DOUBLE",
            Self::Boolean => "BOOLEAN",
            Self::Text => "TEXT",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
        }
    }
}

/// Ordered column name -> storage type mapping derived from the field mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredSchema {
    columns: Vec<(String, ColumnType)>,
}

impl InferredSchema {
    /// Ordered `(name, type)` pairs, identity column first
    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    /// Ordered column names
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Looks up the storage type of a column
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, ty)| *ty)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Classifies a source path into its storage type
///
/// Fixed priority rule over the path, not the value: integer set, then the
/// boolean marker, then the double set, then Text.
pub fn classify_path(path: &str) -> ColumnType {
    if INTEGER_PATHS.contains(&path) {
        ColumnType::Integer
    } else if path.contains(BOOLEAN_MARKER) {
        ColumnType::Boolean
    } else if DOUBLE_PATHS.contains(&path) {
        ColumnType::Double
    } else {
        ColumnType::Text
    }
}

/// Derives the table schema from the field mapping
///
/// The identity column always leads as Integer primary key; a mapping entry
/// targeting it contributes no extra column. The reserved `timestamp` and
/// `post_date` columns are appended only when the mapping does not already
/// claim those names.
pub fn infer_schema(mapping: &[MappingEntry]) -> InferredSchema {
    let mut columns = vec![(IDENTITY_COLUMN.to_string(), ColumnType::Integer)];

    for entry in mapping {
        if entry.column == IDENTITY_COLUMN {
            continue;
        }
        columns.push((entry.column.clone(), classify_path(&entry.path)));
    }

    let mapped: Vec<&str> = mapping.iter().map(|m| m.column.as_str()).collect();
    if !mapped.contains(&TIMESTAMP_COLUMN) {
        columns.push((TIMESTAMP_COLUMN.to_string(), ColumnType::Timestamp));
    }
    if !mapped.contains(&POST_DATE_COLUMN) {
        columns.push((POST_DATE_COLUMN.to_string(), ColumnType::Date));
    }

    InferredSchema { columns }
}
