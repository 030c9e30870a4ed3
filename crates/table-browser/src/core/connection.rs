use std::{
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use tokio::sync::oneshot;

use crate::{
    core::{
        backend::{Backend, ConnectOptions},
        dialect::Dialect,
        query,
        types::{CatalogColumn, DbRow, Statement},
    },
    error::{AppError, AppResult},
};

/// SQLite backend: one connection owned by a dedicated worker thread.
///
/// rusqlite is blocking, so async callers hand tasks to the worker over a
/// channel and await the reply. Tasks run strictly one at a time.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    worker: WorkerHandle,
}

impl SqliteBackend {
    pub fn open(path: &Path, opts: &ConnectOptions) -> AppResult<Self> {
        let path = absolute(path)?;
        let conn = open_conn(&path, opts.acquire_timeout)?;
        Ok(Self {
            worker: WorkerHandle::spawn(conn, path),
        })
    }

    pub fn open_in_memory(opts: &ConnectOptions) -> AppResult<Self> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|source| AppError::DbOpenFailed {
            path: path.clone(),
            source,
        })?;
        set_busy_timeout(&conn, &path, opts.acquire_timeout)?;
        Ok(Self {
            worker: WorkerHandle::spawn(conn, path),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.worker.db_path
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn base_tables(&self) -> AppResult<Vec<String>> {
        self.worker.call(|respond_to| DbTask::Tables { respond_to }).await
    }

    async fn table_columns(&self, table: &str) -> AppResult<Vec<CatalogColumn>> {
        let table = table.to_string();
        self.worker
            .call(|respond_to| DbTask::Columns { table, respond_to })
            .await
    }

    async fn primary_key_columns(&self, table: &str) -> AppResult<Vec<String>> {
        let table = table.to_string();
        self.worker
            .call(|respond_to| DbTask::PrimaryKey { table, respond_to })
            .await
    }

    async fn fetch_rows(&self, stmt: Statement, _order_by: Option<&str>) -> AppResult<Vec<DbRow>> {
        self.worker
            .call(|respond_to| DbTask::Rows { stmt, respond_to })
            .await
    }

    async fn fetch_count(&self, stmt: Statement) -> AppResult<u64> {
        self.worker
            .call(|respond_to| DbTask::Count { stmt, respond_to })
            .await
    }

    async fn execute(&self, stmt: Statement) -> AppResult<u64> {
        self.worker
            .call(|respond_to| DbTask::Execute { stmt, respond_to })
            .await
    }
}

#[derive(Debug, Clone)]
struct WorkerHandle {
    tx: std::sync::mpsc::Sender<DbTask>,
    db_path: PathBuf,
}

impl WorkerHandle {
    fn spawn(conn: Connection, db_path: PathBuf) -> Self {
        let (tx, rx) = std::sync::mpsc::channel::<DbTask>();
        let path_for_thread = db_path.clone();
        thread::spawn(move || db_worker_main(conn, path_for_thread, rx));
        Self { tx, db_path }
    }

    async fn call<T>(
        &self,
        make_task: impl FnOnce(oneshot::Sender<AppResult<T>>) -> DbTask,
    ) -> AppResult<T> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(make_task(tx))
            .map_err(|_| AppError::BackendUnavailable("sqlite worker unavailable".into()))?;
        rx.await
            .map_err(|_| AppError::BackendUnavailable("sqlite worker dropped response".into()))?
    }
}

enum DbTask {
    Tables {
        respond_to: oneshot::Sender<AppResult<Vec<String>>>,
    },
    Columns {
        table: String,
        respond_to: oneshot::Sender<AppResult<Vec<CatalogColumn>>>,
    },
    PrimaryKey {
        table: String,
        respond_to: oneshot::Sender<AppResult<Vec<String>>>,
    },
    Rows {
        stmt: Statement,
        respond_to: oneshot::Sender<AppResult<Vec<DbRow>>>,
    },
    Count {
        stmt: Statement,
        respond_to: oneshot::Sender<AppResult<u64>>,
    },
    Execute {
        stmt: Statement,
        respond_to: oneshot::Sender<AppResult<u64>>,
    },
}

fn db_worker_main(conn: Connection, db_path: PathBuf, rx: std::sync::mpsc::Receiver<DbTask>) {
    tracing::debug!(path=%db_path.display(), "sqlite worker started");

    while let Ok(task) = rx.recv() {
        match task {
            DbTask::Tables { respond_to } => {
                let _ = respond_to.send(query::list_tables(&conn));
            }
            DbTask::Columns { table, respond_to } => {
                let _ = respond_to.send(query::list_columns(&conn, &table));
            }
            DbTask::PrimaryKey { table, respond_to } => {
                let _ = respond_to.send(query::primary_key_columns(&conn, &table));
            }
            DbTask::Rows { stmt, respond_to } => {
                let _ = respond_to.send(query::run_rows(&conn, &stmt));
            }
            DbTask::Count { stmt, respond_to } => {
                let _ = respond_to.send(query::run_count(&conn, &stmt));
            }
            DbTask::Execute { stmt, respond_to } => {
                let _ = respond_to.send(query::run_execute(&conn, &stmt));
            }
        }
    }

    // Every handle is gone; the connection closes with this thread.
    tracing::debug!(path=%db_path.display(), "sqlite worker stopped");
}

fn open_conn(path: &Path, busy_timeout: Duration) -> AppResult<Connection> {
    // No CREATE flag: a missing file is a configuration error, not an empty database.
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags).map_err(|source| AppError::DbOpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    set_busy_timeout(&conn, path, busy_timeout)?;
    Ok(conn)
}

/// SQLite takes the timeout as an `int` of milliseconds; longer waits clamp.
fn set_busy_timeout(conn: &Connection, path: &Path, timeout: Duration) -> AppResult<()> {
    let timeout = timeout.min(Duration::from_millis(i32::MAX as u64));
    conn.busy_timeout(timeout).map_err(|source| AppError::DbOpenFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn absolute(path: &Path) -> AppResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir()?;
        Ok(cwd.join(path))
    }
}
