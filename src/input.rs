//! Relational store and CSV glue.
//!
//! Column kinds are inferred from the stored values: any text makes a column
//! categorical, any blob makes it opaque, everything else is numeric.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags, params_from_iter};
use tracing::{info, warn};

use crate::dataset::{AttributeKind, Column, Dataset, Value};

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Fetch every row of `table` in one `SELECT *`.
pub fn load_table(database: &Path, table: &str) -> Result<Dataset> {
    let conn = Connection::open_with_flags(database, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open database {}", database.display()))?;
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {}", quote_ident(table)))
        .with_context(|| format!("failed to query table `{table}`"))?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    let mut blobs = vec![false; names.len()];
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        for (i, column) in cells.iter_mut().enumerate() {
            let value = match row.get_ref(i)? {
                ValueRef::Null => Value::Missing,
                ValueRef::Integer(n) => Value::Number(n as f64),
                ValueRef::Real(f) => Value::Number(f),
                ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(b) => {
                    blobs[i] = true;
                    Value::Text(format!("<{} bytes>", b.len()))
                }
            };
            column.push(value);
        }
    }

    let columns: Vec<Column> = names
        .into_iter()
        .zip(cells)
        .zip(blobs)
        .map(|((name, values), blob)| {
            if blob {
                warn!(column = %name, "column holds binary data");
                Column::new(name, AttributeKind::Opaque, values)
            } else {
                Column::inferred(name, values)
            }
        })
        .collect();
    let dataset = Dataset::new(columns);
    info!(
        table,
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "loaded table"
    );
    Ok(dataset)
}

/// Read a CSV with a header row. Empty fields are missing, fields that parse
/// as floats are numbers, the rest is text.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to read CSV at {}", path.display()))?;
    let names: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if names.is_empty() {
        return Err(anyhow!("CSV at {} has no header", path.display()));
    }

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("bad CSV record {}", line + 2))?;
        for (i, column) in cells.iter_mut().enumerate() {
            let field = record.get(i).unwrap_or("").trim();
            column.push(if field.is_empty() {
                Value::Missing
            } else if let Ok(n) = field.parse::<f64>() {
                Value::Number(n)
            } else {
                Value::Text(field.to_string())
            });
        }
    }

    let dataset = Dataset::new(
        names
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::inferred(name, values))
            .collect(),
    );
    info!(path = %path.display(), rows = dataset.row_count(), "loaded CSV");
    Ok(dataset)
}

/// (Re)create `table` from `dataset`, appending an integer identifier column
/// numbered from 1.
pub fn seed_table(database: &Path, table: &str, dataset: &Dataset, id_column: &str) -> Result<()> {
    let mut conn = Connection::open(database)
        .with_context(|| format!("failed to open database {}", database.display()))?;
    let mut defs: Vec<String> = dataset
        .columns
        .iter()
        .map(|c| {
            let ty = match c.kind {
                AttributeKind::Numeric => "REAL",
                _ => "TEXT",
            };
            format!("{} {ty}", quote_ident(&c.name))
        })
        .collect();
    defs.push(format!("{} INTEGER", quote_ident(id_column)));

    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table_q}; CREATE TABLE {table_q} ({defs});",
        table_q = quote_ident(table),
        defs = defs.join(", ")
    ))
    .with_context(|| format!("failed to create table `{table}`"))?;
    {
        let placeholders = vec!["?"; defs.len()].join(", ");
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({placeholders})",
            quote_ident(table)
        ))?;
        for row in 0..dataset.row_count() {
            let mut params: Vec<SqlValue> = dataset
                .columns
                .iter()
                .map(|c| match &c.values[row] {
                    Value::Missing => SqlValue::Null,
                    Value::Number(n) if c.kind == AttributeKind::Numeric => SqlValue::Real(*n),
                    other => other.as_text().map_or(SqlValue::Null, SqlValue::Text),
                })
                .collect();
            params.push(SqlValue::Integer(row as i64 + 1));
            stmt.execute(params_from_iter(params))?;
        }
    }
    tx.commit()?;
    info!(table, rows = dataset.row_count(), "seeded table");
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_csv_inference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "x,label,code\n1.5,a,1\n,b,x\n3,a,2\n").unwrap();
        let ds = load_csv(&path).unwrap();
        assert_eq!(ds.names(), vec!["x", "label", "code"]);
        let x = ds.column("x").unwrap();
        assert_eq!(x.kind, AttributeKind::Numeric);
        assert_eq!(x.missing_count(), 1);
        assert_eq!(ds.column("label").unwrap().kind, AttributeKind::Categorical);
        // A single text value turns the whole column categorical.
        assert_eq!(ds.column("code").unwrap().kind, AttributeKind::Categorical);
    }

    #[test]
    fn test_seed_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("data.db");
        let ds = Dataset::new(vec![
            Column::inferred("petal width", vec![Value::Number(0.2), Value::Missing]),
            Column::inferred(
                "species",
                vec![Value::Text("setosa".into()), Value::Text("versicolor".into())],
            ),
        ]);
        seed_table(&db, "iris", &ds, "__ID_piton__").unwrap();

        let loaded = load_table(&db, "iris").unwrap();
        assert_eq!(loaded.names(), vec!["petal width", "species", "__ID_piton__"]);
        assert_eq!(loaded.row_count(), 2);
        assert_eq!(loaded.column("petal width").unwrap().kind, AttributeKind::Numeric);
        assert_eq!(loaded.value(1, "petal width"), Some(&Value::Missing));
        assert_eq!(loaded.value(1, "species"), Some(&Value::Text("versicolor".into())));
        assert_eq!(loaded.value(1, "__ID_piton__"), Some(&Value::Number(2.0)));

        // Seeding again replaces the table.
        seed_table(&db, "iris", &ds, "__ID_piton__").unwrap();
        assert_eq!(load_table(&db, "iris").unwrap().row_count(), 2);
    }

    #[test]
    fn test_blob_column_is_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("blob.db");
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch("CREATE TABLE t (photo BLOB, x REAL); INSERT INTO t VALUES (x'0102', 1.0);")
            .unwrap();
        drop(conn);
        let ds = load_table(&db, "t").unwrap();
        assert_eq!(ds.column("photo").unwrap().kind, AttributeKind::Opaque);
        assert_eq!(ds.column("x").unwrap().kind, AttributeKind::Numeric);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("other.db");
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch("CREATE TABLE other (x REAL);").unwrap();
        drop(conn);
        let err = load_table(&db, "nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
