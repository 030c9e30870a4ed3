use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions},
    query::Query,
    Postgres, Row,
};

use crate::core::{
    backend::{Backend, ConnectOptions},
    dialect::{quote_ident, Dialect},
    types::{BindValue, CatalogColumn, DbRow, Statement},
};
use crate::error::{AppError, AppResult};

const BASE_TABLES_SQL: &str = "
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_schema = $1
      AND table_type = 'BASE TABLE'
    ORDER BY table_name";

const COLUMNS_SQL: &str = "
    SELECT c.column_name::text,
           c.data_type::text,
           c.is_nullable::text,
           c.ordinal_position::int8
    FROM information_schema.columns c
    WHERE c.table_schema = $1
      AND c.table_name = $2
    ORDER BY c.ordinal_position";

const PRIMARY_KEY_SQL: &str = "
    SELECT a.attname::text
    FROM pg_index i
    JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey)
    JOIN pg_class c ON c.oid = i.indrelid
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE i.indisprimary
      AND n.nspname = $1
      AND c.relname = $2";

/// PostgreSQL backend over a shared sqlx pool.
///
/// The pool is built once at startup and closed at shutdown; statement and
/// acquire timeouts are pool settings.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
    schema: String,
}

impl PgBackend {
    pub async fn connect(url: &str, opts: &ConnectOptions) -> AppResult<Self> {
        // Planned statements name tables unqualified; they resolve in the
        // working schema through search_path.
        let mut connect_opts = PgConnectOptions::from_str(url)
            .map_err(|e| AppError::InvalidArgument(format!("bad postgres url: {e}")))?
            .options([("search_path", quote_ident(&opts.schema))]);
        if let Some(timeout) = opts.statement_timeout {
            let ms = timeout.as_millis().to_string();
            connect_opts = connect_opts.options([("statement_timeout", ms.as_str())]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(opts.acquire_timeout)
            .connect_with(connect_opts)
            .await?;

        tracing::info!(schema=%opts.schema, "connected to postgres");
        Ok(Self {
            pool,
            schema: opts.schema.clone(),
        })
    }
}

#[async_trait]
impl Backend for PgBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn base_tables(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query(BASE_TABLES_SQL)
            .bind(self.schema.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>(0).map_err(AppError::from))
            .collect()
    }

    async fn table_columns(&self, table: &str) -> AppResult<Vec<CatalogColumn>> {
        let rows = sqlx::query(COLUMNS_SQL)
            .bind(self.schema.as_str())
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            let is_nullable: String = r.try_get(2)?;
            out.push(CatalogColumn {
                name: r.try_get(0)?,
                sql_type: r.try_get(1)?,
                nullable: is_nullable == "YES",
                ordinal: r.try_get(3)?,
            });
        }
        Ok(out)
    }

    async fn primary_key_columns(&self, table: &str) -> AppResult<Vec<String>> {
        let rows = sqlx::query(PRIMARY_KEY_SQL)
            .bind(self.schema.as_str())
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>(0).map_err(AppError::from))
            .collect()
    }

    async fn fetch_rows(&self, stmt: Statement, order_by: Option<&str>) -> AppResult<Vec<DbRow>> {
        // row_to_json keeps column order and maps every column type to JSON.
        // The outer scan does not inherit the subquery's order.
        let outer_order = order_by.map(|k| format!(" ORDER BY q.{k}")).unwrap_or_default();
        let sql = format!("SELECT row_to_json(q)::text FROM ({}) q{outer_order}", stmt.sql);
        let rows = bind_all(sqlx::query(&sql), &stmt.params)
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            let text: String = r.try_get(0)?;
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(serde_json::Value::Object(map)) => out.push(map),
                _ => return Err(AppError::Internal("row_to_json returned a non-object".into())),
            }
        }
        Ok(out)
    }

    async fn fetch_count(&self, stmt: Statement) -> AppResult<u64> {
        let row = bind_all(sqlx::query(&stmt.sql), &stmt.params)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get(0)?;
        u64::try_from(total).map_err(|_| AppError::Internal("negative row count".into()))
    }

    async fn execute(&self, stmt: Statement) -> AppResult<u64> {
        let done = bind_all(sqlx::query(&stmt.sql), &stmt.params)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn bind_all<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    params: &'q [BindValue],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        q = match p {
            BindValue::Int(n) => q.bind(*n),
            BindValue::Text(s) => q.bind(s.as_str()),
        };
    }
    q
}
