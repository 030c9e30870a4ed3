use base64::Engine as _;
use rusqlite::{
    params_from_iter,
    types::{ToSqlOutput, ValueRef},
    Connection, Row, ToSql,
};

use crate::core::types::{BindValue, CatalogColumn, DbRow, Statement};
use crate::error::{AppError, AppResult};

impl ToSql for BindValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            BindValue::Int(n) => ToSqlOutput::from(*n),
            BindValue::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

pub fn list_tables(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let rows = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_columns(conn: &Connection, table: &str) -> AppResult<Vec<CatalogColumn>> {
    // The table-valued form of PRAGMA table_info takes the name as a bound value.
    let mut stmt = conn.prepare(
        r#"SELECT name, type, "notnull", cid FROM pragma_table_info(?1) ORDER BY cid"#,
    )?;
    let cols = stmt
        .query_map([table], |row: &Row<'_>| {
            let notnull: i64 = row.get(2)?;
            Ok(CatalogColumn {
                name: row.get(0)?,
                sql_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                nullable: notnull == 0,
                ordinal: row.get::<_, i64>(3)? + 1,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cols)
}

pub fn primary_key_columns(conn: &Connection, table: &str) -> AppResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")?;
    let names = stmt
        .query_map([table], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

pub fn run_rows(conn: &Connection, stmt: &Statement) -> AppResult<Vec<DbRow>> {
    let mut prepared = conn.prepare(&stmt.sql)?;
    let col_names: Vec<String> = prepared
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut rows = Vec::new();
    let mut r = prepared.query(params_from_iter(stmt.params.iter()))?;
    while let Some(row) = r.next()? {
        rows.push(row_to_json_object(row, &col_names)?);
    }
    Ok(rows)
}

pub fn run_count(conn: &Connection, stmt: &Statement) -> AppResult<u64> {
    let total: i64 = conn.query_row(&stmt.sql, params_from_iter(stmt.params.iter()), |r| {
        r.get(0)
    })?;
    u64::try_from(total).map_err(|_| AppError::Internal("negative row count".into()))
}

pub fn run_execute(conn: &Connection, stmt: &Statement) -> AppResult<u64> {
    let changes = conn.execute(&stmt.sql, params_from_iter(stmt.params.iter()))?;
    Ok(changes as u64)
}

fn row_to_json_object(row: &Row<'_>, col_names: &[String]) -> AppResult<DbRow> {
    let mut out = DbRow::with_capacity(col_names.len());
    for (i, name) in col_names.iter().enumerate() {
        let v = match row.get_ref(i)? {
            ValueRef::Null => serde_json::Value::Null,
            ValueRef::Integer(x) => serde_json::Value::from(x),
            ValueRef::Real(x) => serde_json::Value::from(x),
            ValueRef::Text(t) => serde_json::Value::from(String::from_utf8_lossy(t).to_string()),
            ValueRef::Blob(b) => serde_json::json!({
                "$type": "blob",
                "base64": base64::engine::general_purpose::STANDARD.encode(b),
                "size": b.len()
            }),
        };
        out.insert(name.clone(), v);
    }
    Ok(out)
}
