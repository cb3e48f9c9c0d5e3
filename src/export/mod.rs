//! CSV export of the `ads` table
//!
//! A read-only projection of the store, ordered by the identity column and
//! written as UTF-8 with a BOM so spreadsheet tools pick up the encoding.
//! Not part of the crawl write path.

use crate::{HarvestError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::io::Write;
use std::path::Path;

/// UTF-8 byte order mark
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Dumps the `ads` table to a CSV file, ordered by id
///
/// Returns the number of exported rows. A missing table (nothing was ever
/// crawled into this database) is a descriptive error, not a panic.
pub fn export_csv(db_path: &Path, csv_path: &Path) -> Result<u64> {
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'ads'",
        [],
        |row| row.get(0),
    )?;
    if table_count == 0 {
        return Err(HarvestError::Export(format!(
            "no 'ads' table in {}",
            db_path.display()
        )));
    }

    let mut file = std::fs::File::create(csv_path)?;
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(file);

    let mut stmt = conn.prepare("SELECT * FROM ads ORDER BY \"id\"")?;
    let column_count = stmt.column_count();
    let header: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    writer.write_record(&header)?;

    let mut exported = 0u64;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut record = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            record.push(render_value(row.get_ref(idx)?));
        }
        writer.write_record(&record)?;
        exported += 1;
    }

    writer.flush()?;
    tracing::info!(
        "Exported {} ads to {}",
        exported,
        csv_path.display()
    );
    Ok(exported)
}

/// Renders one SQLite value as a CSV field
fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingEntry;
    use crate::normalize::normalize;
    use crate::schema::infer_schema;
    use crate::storage::AdStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(path: &str, column: &str) -> MappingEntry {
        MappingEntry {
            path: path.into(),
            column: column.into(),
        }
    }

    #[test]
    fn test_export_ordered_with_bom() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("ads.db");
        let csv_path = dir.path().join("ads.csv");

        let mapping = vec![entry("ad.price", "price"), entry("ad.subject", "subject")];
        let schema = infer_schema(&mapping);
        let store = AdStore::new(&db_path);
        store.ensure_schema(&schema).unwrap();

        // Insert out of id order; export must come back sorted
        for (id, price) in [(300u64, 3.0), (100, 1.0), (200, 2.0)] {
            let doc = json!({"ad": {"list_id": id, "price": price, "subject": "nha"}});
            store.upsert(&normalize(&doc, id, &mapping, &schema)).unwrap();
        }

        let exported = export_csv(&db_path, &csv_path).unwrap();
        assert_eq!(exported, 3);

        let bytes = std::fs::read(&csv_path).unwrap();
        assert_eq!(&bytes[..3], UTF8_BOM);

        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("id,price,subject"));
        assert!(lines[1].starts_with("100,"));
        assert!(lines[2].starts_with("200,"));
        assert!(lines[3].starts_with("300,"));
    }

    #[test]
    fn test_export_missing_table_is_descriptive_error() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("empty.db");
        // Create an empty database file with no tables
        Connection::open(&db_path).unwrap();

        let result = export_csv(&db_path, &dir.path().join("out.csv"));
        assert!(matches!(result, Err(HarvestError::Export(_))));
    }
}
