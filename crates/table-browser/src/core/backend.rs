use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::core::{
    connection::SqliteBackend,
    dialect::Dialect,
    postgres::PgBackend,
    types::{CatalogColumn, DbRow, Statement},
};
use crate::error::{AppError, AppResult};

/// Catalog access and statement execution for one database.
///
/// Every call is a fresh round-trip; nothing is cached between calls.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    fn dialect(&self) -> Dialect;

    /// Base tables of the working schema, alphabetical.
    async fn base_tables(&self) -> AppResult<Vec<String>>;

    /// Column catalog rows of `table`, by ordinal position.
    async fn table_columns(&self, table: &str) -> AppResult<Vec<CatalogColumn>>;

    /// Names of the columns in `table`'s primary key.
    async fn primary_key_columns(&self, table: &str) -> AppResult<Vec<String>>;

    /// Runs a row query. `order_by` names the quoted column `stmt` already
    /// sorts by; backends that wrap `stmt` must keep that order.
    async fn fetch_rows(&self, stmt: Statement, order_by: Option<&str>) -> AppResult<Vec<DbRow>>;

    /// Runs a single-row `COUNT(*)` statement.
    async fn fetch_count(&self, stmt: Statement) -> AppResult<u64>;

    /// Runs a write statement and returns the affected row count.
    async fn execute(&self, stmt: Statement) -> AppResult<u64>;

    async fn close(&self) {}
}

/// Which backend a connection string selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    Postgres(String),
    SqliteMemory,
    SqliteFile(PathBuf),
}

impl DatabaseUrl {
    pub fn parse(url: &str) -> AppResult<Self> {
        let url = url.trim();
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(DatabaseUrl::Postgres(url.to_string()));
        }
        if let Some(rest) = url.strip_prefix("sqlite:") {
            let rest = rest.strip_prefix("//").unwrap_or(rest);
            return match rest {
                ":memory:" => Ok(DatabaseUrl::SqliteMemory),
                "" => Err(AppError::InvalidArgument("sqlite url has no path".into())),
                path => Ok(DatabaseUrl::SqliteFile(PathBuf::from(path))),
            };
        }
        Err(AppError::InvalidArgument(
            "database url must start with postgres://, postgresql:// or sqlite:".into(),
        ))
    }
}

/// Pool and connection settings. Timeouts live here, never in the engine.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub schema: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Option<Duration>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            statement_timeout: None,
        }
    }
}

pub async fn connect(url: &str, opts: &ConnectOptions) -> AppResult<Arc<dyn Backend>> {
    match DatabaseUrl::parse(url)? {
        DatabaseUrl::Postgres(url) => {
            let backend = PgBackend::connect(&url, opts).await?;
            Ok(Arc::new(backend))
        }
        DatabaseUrl::SqliteMemory => Ok(Arc::new(SqliteBackend::open_in_memory(opts)?)),
        DatabaseUrl::SqliteFile(path) => Ok(Arc::new(SqliteBackend::open(&path, opts)?)),
    }
}
